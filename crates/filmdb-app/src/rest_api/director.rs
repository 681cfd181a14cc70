use crate::{crud_api, publish_api_docs, value_router};
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use filmdb_dal::director::{CreateDirector, Director, DirectorRepository};

crud_api!(Director, by_director);

publish_api_docs!();

value_router!("/directors");
