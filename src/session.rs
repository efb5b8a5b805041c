//! Interactive terminal session over a similarity graph.
//!
//! The session moves between three pages: search by title, pick one of the
//! artists recorded for that title, then read the recommendations. It only
//! talks to the graph through its public query API.

use std::io::{self, BufRead, Write};

use crate::graph::SimilarityGraph;
use crate::models::{Recommendation, SongKey};
use crate::normalize::normalize_key;

/// Titles with at least this Jaro-Winkler similarity are offered as suggestions
pub const SUGGESTION_MIN_SIMILARITY: f64 = 0.8;

pub const MAX_SUGGESTIONS: usize = 5;

/// What the session is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Home,
    Results {
        title: String,
        artists: Vec<String>,
    },
    Recommendations {
        seed: SongKey,
        items: Vec<Recommendation>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

/// Query parameters applied to every recommendation request.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub max_results: usize,
    pub threshold: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            threshold: 0.0,
        }
    }
}

pub struct Session<'g> {
    graph: &'g mut SimilarityGraph,
    options: SessionOptions,
    page: Page,
}

impl<'g> Session<'g> {
    pub fn new(graph: &'g mut SimilarityGraph, options: SessionOptions) -> Self {
        Self {
            graph,
            options,
            page: Page::Home,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn prompt(&self) -> &'static str {
        match self.page {
            Page::Home => "title> ",
            Page::Results { .. } => "artist #> ",
            Page::Recommendations { .. } => "title (or :q)> ",
        }
    }

    /// Read lines until EOF or `:q`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.prompt())?;
        out.flush()?;
        for line in input.lines() {
            if self.handle(&line?, out)? == Step::Quit {
                break;
            }
            write!(out, "{}", self.prompt())?;
            out.flush()?;
        }
        Ok(())
    }

    /// Handle one line of input on the current page.
    pub fn handle<W: Write>(&mut self, input: &str, out: &mut W) -> io::Result<Step> {
        let input = input.trim();
        match input {
            ":q" | ":quit" => return Ok(Step::Quit),
            ":back" => {
                self.page = Page::Home;
                return Ok(Step::Continue);
            }
            _ => {}
        }

        match &self.page {
            Page::Home | Page::Recommendations { .. } => self.search(input, out)?,
            Page::Results { title, artists } => {
                let choice = input
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| (1..=artists.len()).contains(&n));
                match choice {
                    Some(n) => {
                        let seed = SongKey::new(title, &artists[n - 1]);
                        self.show_recommendations(seed, out)?;
                    }
                    None => writeln!(out, "Pick a number between 1 and {}.", artists.len())?,
                }
            }
        }
        Ok(Step::Continue)
    }

    fn search<W: Write>(&mut self, title: &str, out: &mut W) -> io::Result<()> {
        if title.is_empty() {
            self.page = Page::Home;
            return Ok(());
        }

        let artists: Vec<String> = self
            .graph
            .catalog()
            .find_artists_by_title(title)
            .into_iter()
            .collect();

        if artists.is_empty() {
            self.page = Page::Home;
            writeln!(out, "No song titled \"{}\".", title)?;
            let suggestions = suggest_titles(self.graph, title);
            if !suggestions.is_empty() {
                writeln!(out, "Did you mean:")?;
                for s in suggestions {
                    writeln!(out, "  {}", s)?;
                }
            }
            return Ok(());
        }

        writeln!(out, "Artists with \"{}\":", normalize_key(title))?;
        for (i, artist) in artists.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, artist)?;
        }
        self.page = Page::Results {
            title: normalize_key(title),
            artists,
        };
        Ok(())
    }

    fn show_recommendations<W: Write>(&mut self, seed: SongKey, out: &mut W) -> io::Result<()> {
        let items = self.graph.recommend_scored(
            &seed.title,
            &seed.artist,
            self.options.max_results,
            self.options.threshold,
        );

        writeln!(out, "Songs like {}:", seed)?;
        if items.is_empty() {
            writeln!(out, "  (no songs meet the similarity threshold)")?;
        }
        for (i, r) in items.iter().enumerate() {
            writeln!(out, "  {:>2}. {:<50} {:6.2}", i + 1, r.song.to_string(), r.score)?;
        }
        self.page = Page::Recommendations { seed, items };
        Ok(())
    }
}

/// Catalog titles close to `query`, best match first.
pub fn suggest_titles(graph: &SimilarityGraph, query: &str) -> Vec<String> {
    let query = normalize_key(query);
    let mut scored: Vec<(f64, &str)> = graph
        .catalog()
        .titles()
        .map(|t| (strsim::jaro_winkler(&query, t), t))
        .filter(|&(sim, _)| sim >= SUGGESTION_MIN_SIMILARITY)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, t)| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SongRow;
    use crate::scoring::ScoringStrategy;

    fn row(title: &str, artist: &str, bpm: f64) -> SongRow {
        SongRow {
            title: title.to_string(),
            artist: artist.to_string(),
            genre: "rock".to_string(),
            bpm,
            ..Default::default()
        }
    }

    fn graph() -> SimilarityGraph {
        SimilarityGraph::from_rows(
            &[
                row("Yesterday", "The Beatles", 97.0),
                row("Yesterday", "Boyz II Men", 70.0),
                row("Hey Jude", "The Beatles", 74.0),
                row("Let It Be", "The Beatles", 143.0),
            ],
            ScoringStrategy::Flat,
        )
        .unwrap()
    }

    fn output(buf: &[u8]) -> String {
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn test_search_then_pick_artist() {
        let mut g = graph();
        let mut session = Session::new(&mut g, SessionOptions::default());
        let mut out = Vec::new();

        session.handle("Yesterday", &mut out).unwrap();
        assert_eq!(
            session.page(),
            &Page::Results {
                title: "yesterday".to_string(),
                artists: vec!["boyz ii men".to_string(), "the beatles".to_string()],
            }
        );

        session.handle("2", &mut out).unwrap();
        match session.page() {
            Page::Recommendations { seed, items } => {
                assert_eq!(seed, &SongKey::new("yesterday", "the beatles"));
                assert_eq!(items.len(), 3);
                // bpm 74 is closer to 97 than 70 is
                assert_eq!(items[0].song, SongKey::new("hey jude", "the beatles"));
                assert_eq!(items[1].song, SongKey::new("yesterday", "boyz ii men"));
            }
            other => panic!("unexpected page {:?}", other),
        }
        assert!(output(&out).contains("Songs like the beatles - yesterday:"));
    }

    #[test]
    fn test_invalid_artist_choice_stays_on_results() {
        let mut g = graph();
        let mut session = Session::new(&mut g, SessionOptions::default());
        let mut out = Vec::new();

        session.handle("hey jude", &mut out).unwrap();
        session.handle("7", &mut out).unwrap();
        assert!(matches!(session.page(), Page::Results { .. }));
        assert!(output(&out).contains("Pick a number between 1 and 1."));
    }

    #[test]
    fn test_unknown_title_suggests() {
        let mut g = graph();
        let mut session = Session::new(&mut g, SessionOptions::default());
        let mut out = Vec::new();

        session.handle("Yesterdy", &mut out).unwrap();
        assert_eq!(session.page(), &Page::Home);
        let text = output(&out);
        assert!(text.contains("No song titled \"Yesterdy\"."));
        assert!(text.contains("  yesterday"));
    }

    #[test]
    fn test_threshold_with_no_results() {
        let mut g = graph();
        let options = SessionOptions {
            max_results: 5,
            threshold: 100.0,
        };
        let mut session = Session::new(&mut g, options);
        let mut out = Vec::new();

        session.handle("Let It Be", &mut out).unwrap();
        session.handle("1", &mut out).unwrap();
        assert!(output(&out).contains("no songs meet the similarity threshold"));
    }

    #[test]
    fn test_back_and_quit() {
        let mut g = graph();
        let mut session = Session::new(&mut g, SessionOptions::default());
        let mut out = Vec::new();

        session.handle("Yesterday", &mut out).unwrap();
        assert_eq!(session.handle(":back", &mut out).unwrap(), Step::Continue);
        assert_eq!(session.page(), &Page::Home);
        assert_eq!(session.handle(":q", &mut out).unwrap(), Step::Quit);
    }

    #[test]
    fn test_run_reads_until_quit() {
        let mut g = graph();
        let mut session = Session::new(&mut g, SessionOptions::default());
        let mut out = Vec::new();

        let input = "hey jude\n1\n:q\nyesterday\n";
        session.run(input.as_bytes(), &mut out).unwrap();
        assert!(matches!(session.page(), Page::Recommendations { .. }));
        assert!(!output(&out).contains("Artists with \"yesterday\""));
    }

    #[test]
    fn test_suggest_titles() {
        let g = graph();
        assert_eq!(suggest_titles(&g, "Hey Jud"), vec!["hey jude".to_string()]);
        assert!(suggest_titles(&g, "zzzz").is_empty());
    }
}
