//! TheCocktailDB random-drink adapter.
//!
//! The upstream returns a random drink per call with no guarantee the first
//! three ingredient/measure pairs are populated, so the fetch re-polls until
//! it sees a complete drink. The original behavior looped forever against a
//! flaky upstream; the loop is capped at [`MAX_ATTEMPTS`] here and reports
//! [`Error::RetriesExhausted`] past the cap.

use crate::adapters::get_json;
use crate::embeds::{colors, LogEmbed};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info};

const RANDOM_URL: &str = "https://www.thecocktaildb.com/api/json/v1/1/random.php";

/// Upper bound on re-polls for a complete drink.
pub const MAX_ATTEMPTS: u32 = 10;

/// How many ingredient/measure pairs must be populated for a drink to count
/// as complete.
const REQUIRED_PAIRS: usize = 3;

/// TheCocktailDB numbers its ingredient columns 1..=15.
const MAX_PAIRS: usize = 15;

#[derive(Debug, Deserialize)]
struct DrinkList {
    drinks: Option<Vec<RawDrink>>,
}

/// One drink as the upstream serves it, with the numbered
/// `strIngredientN`/`strMeasureN` columns collected into a map.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDrink {
    #[serde(rename = "strDrink")]
    name: Option<String>,
    #[serde(rename = "strCategory")]
    category: Option<String>,
    #[serde(rename = "strInstructions")]
    instructions: Option<String>,
    #[serde(rename = "strDrinkThumb")]
    thumbnail: Option<String>,
    #[serde(flatten)]
    columns: HashMap<String, Option<String>>,
}

impl RawDrink {
    fn column(&self, prefix: &str, index: usize) -> Option<&str> {
        self.columns
            .get(&format!("{prefix}{index}"))
            .and_then(|value| value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn ingredient(&self, index: usize) -> Option<&str> {
        self.column("strIngredient", index)
    }

    fn measure(&self, index: usize) -> Option<&str> {
        self.column("strMeasure", index)
    }

    /// A drink is complete when ingredient+measure pairs 1..=3 are all
    /// populated.
    pub fn is_complete(&self) -> bool {
        (1..=REQUIRED_PAIRS).all(|i| self.ingredient(i).is_some() && self.measure(i).is_some())
    }
}

/// A complete drink, reduced to what the embed displays.
#[derive(Debug, Clone)]
pub struct Cocktail {
    pub name: String,
    pub category: String,
    pub instructions: String,
    pub thumbnail: Option<String>,
    /// Pre-formatted "measure ingredient" lines, in upstream order.
    pub ingredient_lines: Vec<String>,
}

impl From<RawDrink> for Cocktail {
    fn from(drink: RawDrink) -> Self {
        let ingredient_lines = (1..=MAX_PAIRS)
            .map_while(|i| {
                drink.ingredient(i).map(|ingredient| {
                    match drink.measure(i) {
                        Some(measure) => format!("**-** {measure} {ingredient}"),
                        None => format!("**-** {ingredient}"),
                    }
                })
            })
            .collect();
        Self {
            name: title_case(drink.name.as_deref().unwrap_or("Unknown Cocktail")),
            category: title_case(drink.category.as_deref().unwrap_or("Unknown Category")),
            instructions: drink
                .instructions
                .clone()
                .unwrap_or_else(|| "No instructions available.".to_string()),
            thumbnail: drink.thumbnail.clone(),
            ingredient_lines,
        }
    }
}

impl Cocktail {
    /// Orchid embed: name as title, category as author, thumbnail, and a
    /// description listing every populated pair then the instructions.
    pub fn embed(&self) -> LogEmbed {
        let mut embed = LogEmbed::new(&self.name, colors::ORCHID)
            .description(format!(
                "**Ingredients:**\n{}\n\n**Instructions:**\n{}",
                self.ingredient_lines.join("\n"),
                self.instructions
            ))
            .author(&self.category, None);
        if let Some(url) = &self.thumbnail {
            embed = embed.thumbnail(url);
        }
        embed
    }
}

/// Fetches a random drink, retrying until it is complete (capped).
pub async fn fetch_cocktail(client: &reqwest::Client) -> Result<Cocktail> {
    let drink = fetch_complete_drink(|| fetch_random_drink(client)).await?;
    info!(name = ?drink.name, "successfully fetched complete cocktail");
    Ok(Cocktail::from(drink))
}

async fn fetch_random_drink(client: &reqwest::Client) -> Result<RawDrink> {
    let list: DrinkList = get_json(client, RANDOM_URL, &[]).await?;
    list.drinks
        .and_then(|mut drinks| {
            if drinks.is_empty() {
                None
            } else {
                Some(drinks.remove(0))
            }
        })
        .ok_or_else(|| Error::Shape("cocktail payload missing `drinks` entry".into()))
}

/// Re-polls `fetch` until it yields a complete drink, at most
/// [`MAX_ATTEMPTS`] times. Generic over the fetch so the retry policy is
/// testable without a network.
pub(crate) async fn fetch_complete_drink<F, Fut>(mut fetch: F) -> Result<RawDrink>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RawDrink>>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let drink = fetch().await?;
        if drink.is_complete() {
            return Ok(drink);
        }
        debug!(attempt, "drink missing primary ingredient pairs, re-polling");
    }
    Err(Error::RetriesExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn complete_drink() -> RawDrink {
        serde_json::from_value(serde_json::json!({
            "strDrink": "margarita",
            "strCategory": "ordinary drink",
            "strInstructions": "Shake with ice.",
            "strDrinkThumb": "https://example.invalid/margarita.jpg",
            "strIngredient1": "Tequila", "strMeasure1": "1 1/2 oz",
            "strIngredient2": "Triple sec", "strMeasure2": "1/2 oz",
            "strIngredient3": "Lime juice", "strMeasure3": "1 oz",
            "strIngredient4": "Salt", "strMeasure4": null
        }))
        .unwrap()
    }

    fn incomplete_drink() -> RawDrink {
        serde_json::from_value(serde_json::json!({
            "strDrink": "mystery",
            "strIngredient1": "Gin", "strMeasure1": "2 oz",
            "strIngredient2": "Tonic", "strMeasure2": null,
            "strIngredient3": null, "strMeasure3": null
        }))
        .unwrap()
    }

    #[test]
    fn test_completeness_check() {
        assert!(complete_drink().is_complete());
        assert!(!incomplete_drink().is_complete());
    }

    #[test]
    fn test_whitespace_only_measure_is_not_populated() {
        let drink: RawDrink = serde_json::from_value(serde_json::json!({
            "strDrink": "x",
            "strIngredient1": "Gin", "strMeasure1": "   ",
            "strIngredient2": "Tonic", "strMeasure2": "1 oz",
            "strIngredient3": "Lime", "strMeasure3": "1"
        }))
        .unwrap();
        assert!(!drink.is_complete());
    }

    #[tokio::test]
    async fn test_retry_until_complete_counts_requests() {
        let calls = AtomicU32::new(0);
        let drink = fetch_complete_drink(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(if n < 3 {
                    incomplete_drink()
                } else {
                    complete_drink()
                })
            }
        })
        .await
        .unwrap();
        assert!(drink.is_complete());
        // 3 incomplete responses then the complete one: exactly 4 requests
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_terminates_at_the_cap() {
        let calls = AtomicU32::new(0);
        let result = fetch_complete_drink(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(incomplete_drink()) }
        })
        .await;
        assert!(matches!(
            result,
            Err(Error::RetriesExhausted {
                attempts: MAX_ATTEMPTS
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_transport_error_short_circuits_the_retry_loop() {
        let calls = AtomicU32::new(0);
        let result = fetch_complete_drink(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Shape("boom".into())) }
        })
        .await;
        assert!(matches!(result, Err(Error::Shape(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cocktail_embed_lists_all_populated_pairs() {
        let cocktail = Cocktail::from(complete_drink());
        assert_eq!(cocktail.name, "Margarita");
        assert_eq!(cocktail.category, "Ordinary Drink");
        // 4th pair has no measure but the ingredient still shows
        assert_eq!(cocktail.ingredient_lines.len(), 4);
        assert_eq!(cocktail.ingredient_lines[3], "**-** Salt");
        let embed = cocktail.embed();
        let description = embed.description.unwrap();
        assert!(description.contains("1 1/2 oz Tequila"));
        assert!(description.contains("**Instructions:**\nShake with ice."));
        assert_eq!(embed.author.unwrap().0, "Ordinary Drink");
    }
}
