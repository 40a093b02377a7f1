use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::str::FromStr;
use tracing::info;

use crate::favourites::{FavouritesStore, Mutation};
use crate::models::Movie;
use crate::storage::KeyValueStore;
use crate::tmdb::CatalogApi;

pub const USAGE: &str = "\
Usage:
  nowplaying now-playing
  nowplaying popular
  nowplaying favourites
  nowplaying add <tmdb_id>
  nowplaying remove <tmdb_id>
  nowplaying toggle <tmdb_id>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NowPlaying,
    Popular,
    Favourites,
    Add(i32),
    Remove(i32),
    Toggle(i32),
}

impl Command {
    pub fn parse<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut args = args.into_iter();
        let name = args
            .next()
            .ok_or_else(|| anyhow!("missing command\n{}", USAGE))?;
        let command: Command = name.as_ref().parse()?;
        let command = match command {
            Command::Add(_) | Command::Remove(_) | Command::Toggle(_) => {
                let raw = args
                    .next()
                    .ok_or_else(|| anyhow!("'{}' needs a movie id\n{}", name.as_ref(), USAGE))?;
                let id = raw
                    .as_ref()
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("invalid movie id '{}'", raw.as_ref()))?;
                command.with_id(id)
            }
            other => other,
        };
        if let Some(extra) = args.next() {
            return Err(anyhow!("unexpected argument '{}'\n{}", extra.as_ref(), USAGE));
        }
        Ok(command)
    }

    fn with_id(self, id: i32) -> Self {
        match self {
            Command::Add(_) => Command::Add(id),
            Command::Remove(_) => Command::Remove(id),
            Command::Toggle(_) => Command::Toggle(id),
            other => other,
        }
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "now-playing" | "now_playing" => Ok(Command::NowPlaying),
            "popular" => Ok(Command::Popular),
            "favourites" | "favorites" => Ok(Command::Favourites),
            "add" => Ok(Command::Add(0)),
            "remove" => Ok(Command::Remove(0)),
            "toggle" => Ok(Command::Toggle(0)),
            other => Err(anyhow!("unknown command '{}'\n{}", other, USAGE)),
        }
    }
}

pub async fn run<S, W>(
    command: Command,
    catalog: &dyn CatalogApi,
    favourites: &FavouritesStore<S>,
    out: &mut W,
) -> Result<()>
where
    S: KeyValueStore,
    W: Write,
{
    match command {
        Command::NowPlaying => {
            let page = catalog.fetch_now_playing().await?;
            print_listing(out, &page.results, favourites).await?;
        }
        Command::Popular => {
            let page = catalog.fetch_popular().await?;
            print_listing(out, &page.results, favourites).await?;
        }
        Command::Favourites => {
            let movies = favourites.list_favourites().await;
            if movies.is_empty() {
                writeln!(out, "No favourites yet")?;
            }
            for movie in &movies {
                writeln!(out, "{}", movie_line(movie, true))?;
            }
        }
        Command::Add(id) => {
            let movie = find_in_catalog(catalog, id).await?;
            let outcome = favourites.add_favourite(&movie).await;
            report_add(out, &movie, outcome)?;
        }
        Command::Remove(id) => {
            let movie = favourites
                .list_favourites()
                .await
                .into_iter()
                .find(|m| m.id == id)
                .unwrap_or(Movie {
                    id,
                    ..Default::default()
                });
            let outcome = favourites.remove_favourite(&movie).await;
            report_remove(out, &movie, outcome)?;
        }
        Command::Toggle(id) => {
            let stored = favourites
                .list_favourites()
                .await
                .into_iter()
                .find(|m| m.id == id);
            if let Some(movie) = stored {
                let outcome = favourites.remove_favourite(&movie).await;
                report_remove(out, &movie, outcome)?;
            } else {
                let movie = find_in_catalog(catalog, id).await?;
                let outcome = favourites.add_favourite(&movie).await;
                report_add(out, &movie, outcome)?;
            }
        }
    }
    Ok(())
}

fn report_add<W: Write>(out: &mut W, movie: &Movie, outcome: Mutation) -> Result<()> {
    match outcome {
        Mutation::Saved => writeln!(out, "Added {}", movie_line(movie, true))?,
        Mutation::Unchanged => writeln!(out, "Already a favourite: {}", movie_line(movie, true))?,
        Mutation::Failed => writeln!(out, "Could not save favourites, {} not added", movie.id)?,
    }
    Ok(())
}

fn report_remove<W: Write>(out: &mut W, movie: &Movie, outcome: Mutation) -> Result<()> {
    match outcome {
        Mutation::Saved => writeln!(out, "Removed {}", movie_line(movie, false))?,
        Mutation::Unchanged => writeln!(out, "Movie {} is not a favourite", movie.id)?,
        Mutation::Failed => writeln!(out, "Could not save favourites, {} not removed", movie.id)?,
    }
    Ok(())
}

async fn find_in_catalog(catalog: &dyn CatalogApi, id: i32) -> Result<Movie> {
    let now_playing = catalog.fetch_now_playing().await?;
    if let Some(movie) = now_playing.results.into_iter().find(|m| m.id == id) {
        return Ok(movie);
    }
    info!("Movie {} not in now playing, checking popular", id);
    catalog
        .fetch_popular()
        .await?
        .results
        .into_iter()
        .find(|m| m.id == id)
        .ok_or_else(|| anyhow!("Movie {} is not in the now playing or popular listings", id))
}

async fn print_listing<S, W>(
    out: &mut W,
    movies: &[Movie],
    favourites: &FavouritesStore<S>,
) -> Result<()>
where
    S: KeyValueStore,
    W: Write,
{
    let starred = favourites.list_favourites().await;
    for movie in movies {
        let is_fav = starred.iter().any(|m| m.same_movie(movie));
        writeln!(out, "{}", movie_line(movie, is_fav))?;
    }
    Ok(())
}

fn movie_line(movie: &Movie, favourite: bool) -> String {
    let marker = if favourite { '*' } else { ' ' };
    let year = movie
        .release_date
        .as_deref()
        .and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .map(|y| format!(" ({y})"))
        .unwrap_or_default();
    format!(
        "{} {:>8}  {}{}  {:.1}",
        marker,
        movie.id,
        movie.display_title(),
        year,
        movie.vote_average
    )
}
