mod value_repo;

/// Derives repository for simple value entity.
///
/// Struct must have `id: i64` field, all other named fields are value fields,
/// stored in table named as lowercased struct name. Generates:
/// - `Create<Entity>` payload (value fields only, keeping `garde` rules), used both
///   for create and full replace
/// - `<Entity>RepositoryImpl<E>` and `<Entity>Repository` alias over pool
///
/// Generated code expects `crate::ChosenDB`, `crate::Error` and `crate::error::Result`
/// to be available.
#[proc_macro_derive(ValueRepository, attributes(garde))]
pub fn value_repo(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    value_repo::repository(input)
}
