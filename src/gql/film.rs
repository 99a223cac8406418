//! Film queries over the static catalog.

use async_graphql::{ComplexObject, Context, Object, Result, SimpleObject};
use std::sync::Arc;

use crate::catalog::{self, Catalog};

#[derive(SimpleObject)]
pub struct Director {
    pub id: i32,
    pub name: String,
}

impl From<&catalog::Director> for Director {
    fn from(d: &catalog::Director) -> Self {
        Self {
            id: d.id,
            name: d.name.to_string(),
        }
    }
}

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct Film {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub genre: String,
    pub description: String,
    /// Running time in minutes
    pub running_time: f64,
    pub director_id: i32,
    /// Release date
    pub release: String,
    pub poster_img: String,
}

impl From<&catalog::Film> for Film {
    fn from(f: &catalog::Film) -> Self {
        Self {
            id: f.id,
            title: f.title.to_string(),
            subtitle: f.subtitle.map(|s| s.to_string()),
            genre: f.genre.to_string(),
            description: f.description.to_string(),
            running_time: f.running_time,
            director_id: f.director_id,
            release: f.release.to_string(),
            poster_img: f.poster_img.clone(),
        }
    }
}

#[ComplexObject]
impl Film {
    async fn director(&self, ctx: &Context<'_>) -> Result<Director> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        catalog
            .director(self.director_id)
            .map(Director::from)
            .ok_or_else(|| format!("Unknown director {}", self.director_id).into())
    }
}

/// One page of films plus the cursor for the next page.
#[derive(SimpleObject)]
pub struct PaginatedFilms {
    pub films: Vec<Film>,
    pub cursor: Option<i32>,
}

#[derive(Default)]
pub struct FilmQuery;

#[Object]
impl FilmQuery {
    /// Films in ascending id order, paginated by cursor. The cursor is the
    /// id of the first film of the requested page; the response carries the
    /// cursor for the following page, or null at the end of the list.
    async fn films(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 6)] limit: i32,
        #[graphql(default = 1)] cursor: i32,
    ) -> Result<PaginatedFilms> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        let page = catalog.films_page(limit, cursor);
        Ok(PaginatedFilms {
            films: page.films.iter().map(Film::from).collect(),
            cursor: page.cursor,
        })
    }

    async fn film(&self, ctx: &Context<'_>, film_id: i32) -> Result<Option<Film>> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        Ok(catalog.film(film_id).map(Film::from))
    }
}
