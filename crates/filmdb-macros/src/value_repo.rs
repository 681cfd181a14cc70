use quote::{format_ident, quote};
use syn::{Data, Field};

const ID_FIELD: &str = "id";
const GARDE: &str = "garde";

fn prepare_field(f: &Field) -> Field {
    let mut field = f.clone();
    field.attrs.retain(|attr| attr.path().is_ident(GARDE));
    if field.attrs.is_empty() {
        field.attrs.push(syn::parse_quote!(#[garde(skip)]));
    }
    field.vis = syn::Visibility::Public(syn::token::Pub::default());
    field
}

fn is_id(f: &Field) -> bool {
    f.ident.as_ref().is_some_and(|i| *i == ID_FIELD)
}

pub fn repository(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);
    let entity_ident = input.ident.clone();
    let entity_name = entity_ident.to_string();
    let table_name = entity_name.to_lowercase();

    let Data::Struct(data) = input.data else {
        let e = syn::Error::new(input.ident.span(), "Unexpected data type, should be struct");
        return e.to_compile_error().into();
    };

    if !data.fields.iter().any(is_id) {
        let e = syn::Error::new(
            input.ident.span(),
            format!("Entity {entity_name} must have `id` field"),
        );
        return e.to_compile_error().into();
    }

    let value_fields = data
        .fields
        .iter()
        .filter(|f| f.ident.is_some() && !is_id(f))
        .collect::<Vec<_>>();

    if value_fields.is_empty() {
        let e = syn::Error::new(
            input.ident.span(),
            format!("Entity {entity_name} has no value fields"),
        );
        return e.to_compile_error().into();
    }

    let create_fields = value_fields.iter().map(|f| prepare_field(f));
    // unwrap is ok as we filter unnamed fields above
    let field_idents = value_fields
        .iter()
        .map(|f| f.ident.clone().unwrap())
        .collect::<Vec<_>>();
    let field_names = field_idents
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>();

    // PAYLOAD =================================================================
    let create_struct_name = format_ident!("Create{}", entity_name);
    let create_struct = quote! {
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize, garde::Validate)]
        #[serde(deny_unknown_fields)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub struct #create_struct_name {
            #(#create_fields,)*
        }
    };

    // REPO ===================================================================
    let repo_name = format_ident!("{}Repository", entity_name);
    let repo_impl_name = format_ident!("{}RepositoryImpl", entity_name);

    let columns = field_names.join(", ");
    let placeholders = field_names
        .iter()
        .map(|_| "?")
        .collect::<Vec<_>>()
        .join(", ");
    let assignments = field_names
        .iter()
        .map(|f| format!("{f} = ?"))
        .collect::<Vec<_>>()
        .join(", ");

    let insert_cmd = format!("INSERT INTO {table_name} ({columns}) VALUES ({placeholders})");
    let update_cmd = format!("UPDATE {table_name} SET {assignments} WHERE id = ?");
    let delete_cmd = format!("DELETE FROM {table_name} WHERE id = ?");
    let count_cmd = format!("SELECT count(*) FROM {table_name}");
    let select_many_query = format!("SELECT id, {columns} FROM {table_name} ORDER BY id");
    let select_one_query = format!("SELECT id, {columns} FROM {table_name} WHERE id = ?");

    let bound_fields = field_idents
        .iter()
        .map(|f| quote!(.bind(&payload.#f)))
        .collect::<Vec<_>>();

    let repo_impl = quote! {
        pub type #repo_name = #repo_impl_name<sqlx::Pool<crate::ChosenDB>>;

        pub struct #repo_impl_name<E> {
            executor: E,
        }

        impl<'c, E> #repo_impl_name<E>
        where
            for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
        {
            pub fn new(executor: E) -> Self {
                Self { executor }
            }

            pub async fn create(&self, payload: #create_struct_name) -> crate::error::Result<#entity_ident> {
                let result = sqlx::query(#insert_cmd)
                    #(#bound_fields)*
                    .execute(&self.executor)
                    .await?;

                let id = result.last_insert_rowid();
                tracing::debug!("Created {} {}", #entity_name, id);
                self.get(id).await
            }

            pub async fn update(&self, id: i64, payload: #create_struct_name) -> crate::error::Result<#entity_ident> {
                let result = sqlx::query(#update_cmd)
                    #(#bound_fields)*
                    .bind(id)
                    .execute(&self.executor)
                    .await?;

                if result.rows_affected() == 0 {
                    Err(crate::Error::RecordNotFound { entity: #entity_name, id })
                } else {
                    tracing::debug!("Replaced {} {}", #entity_name, id);
                    self.get(id).await
                }
            }

            pub async fn count(&self) -> crate::error::Result<u64> {
                let count: i64 = sqlx::query_scalar(#count_cmd)
                    .fetch_one(&self.executor)
                    .await?;
                Ok(count as u64)
            }

            pub async fn list(&self) -> crate::error::Result<Vec<#entity_ident>> {
                let records = sqlx::query_as::<_, #entity_ident>(#select_many_query)
                    .fetch_all(&self.executor)
                    .await?;
                Ok(records)
            }

            pub async fn delete(&self, id: i64) -> crate::error::Result<()> {
                let res = sqlx::query(#delete_cmd)
                    .bind(id)
                    .execute(&self.executor)
                    .await?;

                if res.rows_affected() == 0 {
                    Err(crate::Error::RecordNotFound { entity: #entity_name, id })
                } else {
                    tracing::debug!("Deleted {} {}", #entity_name, id);
                    Ok(())
                }
            }

            pub async fn get(&self, id: i64) -> crate::error::Result<#entity_ident> {
                sqlx::query_as::<_, #entity_ident>(#select_one_query)
                    .bind(id)
                    .fetch_optional(&self.executor)
                    .await?
                    .ok_or(crate::Error::RecordNotFound { entity: #entity_name, id })
            }
        }
    };
    // REPO END ===============================================================

    quote! {
        #create_struct
        #repo_impl
    }
    .into()
}
