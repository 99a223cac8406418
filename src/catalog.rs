//! Static film catalog.
//!
//! Films, directors, and cuts are fixed editorial content served from
//! memory; only user-generated data (accounts, votes, reviews) lives in
//! the database. Cut ids are derived from the film id so vote and review
//! rows can reference them stably.

/// Maximum films returned per page, regardless of the requested limit.
pub const MAX_PAGE_SIZE: i32 = 6;

#[derive(Debug, Clone)]
pub struct Director {
    pub id: i32,
    pub name: &'static str,
}

#[derive(Debug, Clone)]
pub struct Film {
    pub id: i32,
    pub title: &'static str,
    pub subtitle: Option<&'static str>,
    pub genre: &'static str,
    pub description: &'static str,
    /// Running time in minutes
    pub running_time: f64,
    pub director_id: i32,
    pub release: &'static str,
    pub poster_img: String,
}

#[derive(Debug, Clone)]
pub struct Cut {
    pub id: i32,
    pub src: String,
    pub film_id: i32,
}

/// One page of films plus the cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct FilmPage {
    pub films: Vec<Film>,
    pub cursor: Option<i32>,
}

struct FilmSeed {
    title: &'static str,
    subtitle: Option<&'static str>,
    genre: &'static str,
    description: &'static str,
    running_time: f64,
    director_id: i32,
    release: &'static str,
    cut_count: i32,
}

const DIRECTORS: &[Director] = &[
    Director { id: 1, name: "Hayao Miyazaki" },
    Director { id: 2, name: "Isao Takahata" },
    Director { id: 3, name: "Yoshifumi Kondo" },
    Director { id: 4, name: "Hiromasa Yonebayashi" },
    Director { id: 5, name: "Goro Miyazaki" },
];

const FILM_SEEDS: &[FilmSeed] = &[
    FilmSeed {
        title: "Castle in the Sky",
        subtitle: None,
        genre: "Adventure",
        description: "A young girl with a mysterious crystal and a boy from a mining town chase the legend of a castle drifting in the sky.",
        running_time: 125.0,
        director_id: 1,
        release: "1986-08-02",
        cut_count: 9,
    },
    FilmSeed {
        title: "Grave of the Fireflies",
        subtitle: None,
        genre: "Drama",
        description: "Two siblings struggle to survive in Kobe during the final months of the Second World War.",
        running_time: 89.0,
        director_id: 2,
        release: "1988-04-16",
        cut_count: 6,
    },
    FilmSeed {
        title: "My Neighbor Totoro",
        subtitle: None,
        genre: "Fantasy",
        description: "Two sisters move to the countryside and befriend the gentle forest spirits living beside their new home.",
        running_time: 86.0,
        director_id: 1,
        release: "1988-04-16",
        cut_count: 9,
    },
    FilmSeed {
        title: "Kiki's Delivery Service",
        subtitle: None,
        genre: "Coming of age",
        description: "A young witch sets up a flying delivery service in a seaside town and learns to stand on her own.",
        running_time: 103.0,
        director_id: 1,
        release: "1989-07-29",
        cut_count: 8,
    },
    FilmSeed {
        title: "Only Yesterday",
        subtitle: None,
        genre: "Drama",
        description: "A Tokyo office worker travels to the countryside and finds her ten-year-old self travelling with her.",
        running_time: 118.0,
        director_id: 2,
        release: "1991-07-20",
        cut_count: 5,
    },
    FilmSeed {
        title: "Porco Rosso",
        subtitle: None,
        genre: "Adventure",
        description: "A veteran seaplane pilot cursed with the face of a pig hunts air pirates over the Adriatic.",
        running_time: 94.0,
        director_id: 1,
        release: "1992-07-18",
        cut_count: 7,
    },
    FilmSeed {
        title: "Whisper of the Heart",
        subtitle: None,
        genre: "Romance",
        description: "A bookish girl follows a cat to an antique shop and finds the courage to test her own talent.",
        running_time: 111.0,
        director_id: 3,
        release: "1995-07-15",
        cut_count: 6,
    },
    FilmSeed {
        title: "Princess Mononoke",
        subtitle: None,
        genre: "Epic",
        description: "Cursed by a dying boar god, a young prince is drawn into the war between iron town and the spirits of the forest.",
        running_time: 134.0,
        director_id: 1,
        release: "1997-07-12",
        cut_count: 9,
    },
    FilmSeed {
        title: "Spirited Away",
        subtitle: None,
        genre: "Fantasy",
        description: "A ten-year-old girl must work in a bathhouse for spirits to free her parents and find her way home.",
        running_time: 125.0,
        director_id: 1,
        release: "2001-07-20",
        cut_count: 10,
    },
    FilmSeed {
        title: "Howl's Moving Castle",
        subtitle: None,
        genre: "Fantasy",
        description: "Turned into an old woman by a witch's curse, a hatter takes refuge in the walking castle of the wizard Howl.",
        running_time: 119.0,
        director_id: 1,
        release: "2004-11-20",
        cut_count: 8,
    },
    FilmSeed {
        title: "From Up on Poppy Hill",
        subtitle: None,
        genre: "Romance",
        description: "Two students fight to save their school's ramshackle clubhouse in a port town preparing for the Olympics.",
        running_time: 91.0,
        director_id: 5,
        release: "2011-07-16",
        cut_count: 5,
    },
    FilmSeed {
        title: "When Marnie Was There",
        subtitle: None,
        genre: "Mystery",
        description: "Sent to the seaside for her health, a lonely girl befriends the mysterious Marnie in the marsh house.",
        running_time: 103.0,
        director_id: 4,
        release: "2014-07-19",
        cut_count: 6,
    },
];

/// Base URL for the editorial art assets, keyed by film and cut index.
const ASSET_BASE: &str = "https://assets.filmcuts.dev";

pub struct Catalog {
    films: Vec<Film>,
    cuts: Vec<Cut>,
}

impl Catalog {
    pub fn new() -> Self {
        let mut films = Vec::with_capacity(FILM_SEEDS.len());
        let mut cuts = Vec::new();

        for (idx, seed) in FILM_SEEDS.iter().enumerate() {
            let film_id = idx as i32 + 1;
            films.push(Film {
                id: film_id,
                title: seed.title,
                subtitle: seed.subtitle,
                genre: seed.genre,
                description: seed.description,
                running_time: seed.running_time,
                director_id: seed.director_id,
                release: seed.release,
                poster_img: format!("{}/posters/{}.jpg", ASSET_BASE, film_id),
            });
            for n in 1..=seed.cut_count {
                cuts.push(Cut {
                    // Stable across releases: film 3, cut 2 is always 302
                    id: film_id * 100 + n,
                    src: format!("{}/cuts/{}/{}.jpg", ASSET_BASE, film_id, n),
                    film_id,
                });
            }
        }

        Self { films, cuts }
    }

    /// One page of films in ascending id order, starting at the film whose
    /// id equals `cursor`. The returned cursor is one past the last id of
    /// the page when more films exist, or None at the end of the list.
    pub fn films_page(&self, limit: i32, cursor: i32) -> FilmPage {
        let limit = limit.clamp(0, MAX_PAGE_SIZE) as usize;

        // Unknown cursor (including past-the-end) yields an empty page
        let Some(start) = self.films.iter().position(|f| f.id == cursor) else {
            return FilmPage {
                films: Vec::new(),
                cursor: None,
            };
        };

        let films: Vec<Film> = self.films[start..].iter().take(limit).cloned().collect();

        let cursor = films
            .last()
            .map(|last| last.id + 1)
            .filter(|next| self.films.iter().any(|f| f.id == *next));

        FilmPage { films, cursor }
    }

    pub fn film(&self, film_id: i32) -> Option<&Film> {
        self.films.iter().find(|f| f.id == film_id)
    }

    pub fn director(&self, director_id: i32) -> Option<&Director> {
        DIRECTORS.iter().find(|d| d.id == director_id)
    }

    pub fn cuts_for_film(&self, film_id: i32) -> Vec<&Cut> {
        self.cuts.iter().filter(|c| c.film_id == film_id).collect()
    }

    pub fn cut(&self, cut_id: i32) -> Option<&Cut> {
        self.cuts.iter().find(|c| c.id == cut_id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_films_are_ascending_from_one() {
        let catalog = Catalog::new();
        let page = catalog.films_page(6, 1);

        assert_eq!(page.films.len(), 6);
        let ids: Vec<i32> = page.films.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        // More films exist, so the cursor points one past the last id
        assert_eq!(page.cursor, Some(7));
    }

    #[test]
    fn test_limit_is_capped() {
        let catalog = Catalog::new();
        let page = catalog.films_page(100, 1);
        assert_eq!(page.films.len(), MAX_PAGE_SIZE as usize);
    }

    #[test]
    fn test_last_page_has_null_cursor() {
        let catalog = Catalog::new();
        let page = catalog.films_page(6, 7);

        assert_eq!(page.films.len(), 6);
        assert_eq!(page.films.last().unwrap().id, 12);
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn test_unknown_cursor_yields_empty_page() {
        let catalog = Catalog::new();
        let page = catalog.films_page(6, 999);
        assert!(page.films.is_empty());
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn test_every_film_has_a_director() {
        let catalog = Catalog::new();
        for film in &catalog.films {
            assert!(
                catalog.director(film.director_id).is_some(),
                "film {} has no director",
                film.id
            );
        }
    }

    #[test]
    fn test_cut_lookup_and_film_link() {
        let catalog = Catalog::new();

        let cuts = catalog.cuts_for_film(3);
        assert!(!cuts.is_empty());
        assert!(cuts.iter().all(|c| c.film_id == 3));

        let cut = catalog.cut(302).expect("cut 302 exists");
        assert_eq!(cut.film_id, 3);
        assert!(catalog.cut(9999).is_none());
    }

    #[test]
    fn test_cut_ids_are_unique() {
        let catalog = Catalog::new();
        let mut ids: Vec<i32> = catalog.cuts.iter().map(|c| c.id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
