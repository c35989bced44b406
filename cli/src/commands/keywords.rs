use dost_core::KeywordCategory;
use dost_core::keywords::{self, CategoryPhrases};

use crate::util::{exit_error, print_json};

/// Print the trigger phrase taxonomy, optionally one category only.
pub fn run(category: Option<&str>, raw: bool) -> i32 {
    match select(category) {
        Ok(categories) => {
            print_json(&categories, raw);
            0
        }
        Err(e) => exit_error(
            &e.to_string(),
            Some("Categories: suicide_ideation, self_harm, hopelessness, crisis_method"),
        ),
    }
}

fn select(category: Option<&str>) -> Result<Vec<CategoryPhrases>, dost_core::error::CoreError> {
    let only = category.map(str::parse::<KeywordCategory>).transpose()?;
    Ok(keywords::taxonomy(only))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_one_category_by_name() {
        let categories = select(Some("hopelessness")).unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, KeywordCategory::Hopelessness);
        assert_eq!(select(None).unwrap().len(), 4);
    }

    #[test]
    fn unknown_category_is_an_error() {
        let err = select(Some("sadness")).unwrap_err();
        assert_eq!(err.field(), "category");
    }
}
