use crate::{crud_api, publish_api_docs, value_router};
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use filmdb_dal::genre::{CreateGenre, Genre, GenreRepository};

crud_api!(Genre, by_genre);

publish_api_docs!();

value_router!("/genres");
