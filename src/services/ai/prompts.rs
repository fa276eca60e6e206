// src/services/ai/prompts.rs
//! Instruction text sent to the provider

pub const LISTING_ANALYSIS_TASK: &str =
    "Analyse this photo of a second-hand sporting good and return the JSON object.";

/// Human name of a UI language code, for "answer in ..." instructions
pub fn language_name(code: &str) -> &'static str {
    match code.trim().to_lowercase().as_str() {
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "ca" => "Catalan",
        _ => "English",
    }
}

pub fn listing_analysis_prompt(language: &str) -> String {
    format!(
        r#"You help people sell used sports equipment on a marketplace.
First decide whether the photo is acceptable for a public listing. It is NOT acceptable if it shows nudity, violence, weapons, drugs, hateful symbols, or anything that is not a sellable sporting good.

Reply with a single JSON object and nothing else:
{{
  "isSafe": boolean,
  "safetyReason": string or null (why the photo was rejected),
  "title": string (max 80 characters),
  "category": one of "Cycling", "Running", "Swimming", "Triathlon", "Other",
  "brand": string ("" when unknown),
  "condition": one of "New", "Like-New", "Good", "Fair",
  "description": string (2-4 sentences for buyers),
  "suggestedPrice": number (fair second-hand price in EUR),
  "tags": array of up to 8 short lowercase strings
}}

Write title, description, safetyReason and tags in {}."#,
        language_name(language)
    )
}

pub fn shop_profile_prompt(language: &str) -> String {
    format!(
        r#"You name and describe small second-hand sports gear shops.
Reply with a single JSON object and nothing else:
{{ "shopName": string (max 40 characters), "shopDescription": string (2-3 friendly sentences) }}
Write both fields in {}."#,
        language_name(language)
    )
}

pub fn shop_profile_task(brief: Option<&str>) -> String {
    match brief {
        Some(brief) => format!("The seller describes the shop like this: {}", brief),
        None => "Base the shop identity on the attached photo.".to_string(),
    }
}

/// Chat persona, including the product link contract the client renders
pub fn assistant_system_prompt(site_name: &str, language: &str, inventory: &str) -> String {
    let inventory = if inventory.trim().is_empty() {
        "(no products are listed right now)"
    } else {
        inventory
    };
    format!(
        r#"You are the shopping assistant of {site}, a marketplace for second-hand cycling, running, swimming and triathlon gear.
Answer in {lang}. Be concise and practical.
Only recommend products from the inventory below. When you mention one, link it exactly as [Title](ID:product-id) using the id from the list.
If nothing fits, say so and suggest what to look for.

Inventory:
{inventory}"#,
        site = site_name,
        lang = language_name(language),
        inventory = inventory
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_fallback_is_english() {
        assert_eq!(language_name("ES"), "Spanish");
        assert_eq!(language_name("xx"), "English");
        assert!(listing_analysis_prompt("fr").contains("French"));
    }

    #[test]
    fn test_assistant_prompt_states_link_contract() {
        let prompt = assistant_system_prompt("GearSwap", "en", "- Bike (ID:P_1) — 10 EUR");
        assert!(prompt.contains("[Title](ID:product-id)"));
        assert!(prompt.contains("- Bike (ID:P_1) — 10 EUR"));

        let empty = assistant_system_prompt("GearSwap", "en", "");
        assert!(empty.contains("no products are listed"));
    }
}
