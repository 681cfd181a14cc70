use std::fmt::Display;

use crate::{Error, error::Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

const ENTITY: &str = "Movie";

const SELECT_MOVIE: &str = r#"
SELECT m.id, m.title, m.description, m.trailer, m.year, m.rating,
g.name AS genre, d.name AS director
FROM movie m
LEFT JOIN genre g ON m.genre_id = g.id
LEFT JOIN director d ON m.director_id = d.id
"#;

// Unset side of the filter binds NULL and matches every row
const FILTER_CONDITION: &str =
    "(? IS NULL OR m.director_id = ?) AND (? IS NULL OR m.genre_id = ?)";

/// Payload for both creating movie and replacing it as a whole.
///
/// Optional fields missing in the payload are stored as NULL.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(deny_unknown_fields)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateMovie {
    #[garde(length(min = 1, max = 255))]
    pub title: String,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    #[garde(url, length(max = 1023))]
    pub trailer: Option<String>,
    #[garde(range(min = 1888, max = 2100))]
    pub year: Option<i64>,
    #[garde(range(min = 0.0, max = 10.0))]
    pub rating: Option<f64>,
    #[garde(range(min = 1))]
    pub genre_id: Option<i64>,
    #[garde(range(min = 1))]
    pub director_id: Option<i64>,
}

/// Read view of movie, genre and director are resolved to their names
/// (`None` if not set or referenced record does not exist).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub trailer: Option<String>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub director: Option<String>,
}

/// Conjunctive filter on movie references, zero id is same as no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovieFilter {
    director_id: Option<i64>,
    genre_id: Option<i64>,
}

impl MovieFilter {
    pub fn new(director_id: Option<i64>, genre_id: Option<i64>) -> Self {
        Self {
            director_id: director_id.filter(|id| *id != 0),
            genre_id: genre_id.filter(|id| *id != 0),
        }
    }

    pub fn by_director(director_id: i64) -> Self {
        Self::new(Some(director_id), None)
    }

    pub fn by_genre(genre_id: i64) -> Self {
        Self::new(None, Some(genre_id))
    }

    pub fn director_id(&self) -> Option<i64> {
        self.director_id
    }

    pub fn genre_id(&self) -> Option<i64> {
        self.genre_id
    }

    pub fn is_empty(&self) -> bool {
        self.director_id.is_none() && self.genre_id.is_none()
    }
}

impl Display for MovieFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.director_id, self.genre_id) {
            (None, None) => write!(f, "no filter"),
            (Some(d), None) => write!(f, "director_id={d}"),
            (None, Some(g)) => write!(f, "genre_id={g}"),
            (Some(d), Some(g)) => write!(f, "director_id={d}, genre_id={g}"),
        }
    }
}

pub type MovieRepository = MovieRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateMovie) -> Result<Movie> {
        let result = sqlx::query(
            "INSERT INTO movie (title, description, trailer, year, rating, genre_id, director_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.trailer)
        .bind(payload.year)
        .bind(payload.rating)
        .bind(payload.genre_id)
        .bind(payload.director_id)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created movie {id}");
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateMovie) -> Result<Movie> {
        let result = sqlx::query(
            "UPDATE movie SET title = ?, description = ?, trailer = ?, year = ?, rating = ?, genre_id = ?, director_id = ? WHERE id = ?",
        )
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.trailer)
        .bind(payload.year)
        .bind(payload.rating)
        .bind(payload.genre_id)
        .bind(payload.director_id)
        .bind(id)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound { entity: ENTITY, id })
        } else {
            debug!("Replaced movie {id}");
            self.get(id).await
        }
    }

    pub async fn list(&self, filter: MovieFilter) -> Result<Vec<Movie>> {
        let sql = format!("{SELECT_MOVIE} WHERE {FILTER_CONDITION} ORDER BY m.id");
        let records = sqlx::query_as::<_, Movie>(&sql)
            .bind(filter.director_id)
            .bind(filter.director_id)
            .bind(filter.genre_id)
            .bind(filter.genre_id)
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn count(&self, filter: MovieFilter) -> Result<u64> {
        let sql = format!("SELECT count(*) FROM movie m WHERE {FILTER_CONDITION}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.director_id)
            .bind(filter.director_id)
            .bind(filter.genre_id)
            .bind(filter.genre_id)
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM movie WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound { entity: ENTITY, id })
        } else {
            debug!("Deleted movie {id}");
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        let sql = format!("{SELECT_MOVIE} WHERE m.id = ?");
        sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or(Error::RecordNotFound { entity: ENTITY, id })
    }
}
