use crate::error::{PipelineError, Result};
use crate::models::{
    is_no_keywords, Document, KeywordResult, KeywordSet, OutputRow, NO_KEYWORDS_PLACEHOLDER,
};
use std::cmp::Ordering;

pub const KEYWORD_DELIMITER: &str = ", ";

/// Renders each result set as one delimited keyword string, index for index.
pub fn aggregate(results: Vec<KeywordSet>) -> Vec<String> {
    results.into_iter().map(format_keywords).collect()
}

pub fn format_keywords(set: KeywordSet) -> String {
    let mut set = if is_no_keywords(&set) {
        vec![KeywordResult {
            phrase: NO_KEYWORDS_PLACEHOLDER.to_string(),
            score: None,
        }]
    } else {
        set
    };

    // Stable, so equal scores keep the model's order.
    set.sort_by(|left, right| compare_scores_desc(left.score, right.score));

    set.iter()
        .map(|result| result.phrase.to_uppercase())
        .collect::<Vec<_>>()
        .join(KEYWORD_DELIMITER)
}

fn compare_scores_desc(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => right.total_cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Pairs every document id with the keyword string at the same position.
pub fn assemble_rows(documents: &[Document], keywords: Vec<String>) -> Result<Vec<OutputRow>> {
    if documents.len() != keywords.len() {
        return Err(PipelineError::Extraction(format!(
            "{} keyword strings for {} documents",
            keywords.len(),
            documents.len()
        )));
    }

    Ok(documents
        .iter()
        .zip(keywords)
        .map(|(document, keywords)| OutputRow {
            id: document.id.clone(),
            keywords,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleId;

    #[test]
    fn phrases_are_ranked_by_score_and_upper_cased() {
        let set = vec![
            KeywordResult::new("a", 0.3),
            KeywordResult::new("b", 0.9),
            KeywordResult::new("c", 0.6),
        ];
        assert_eq!(format_keywords(set), "B, C, A");
    }

    #[test]
    fn ties_keep_model_order() {
        let set = vec![
            KeywordResult::new("second", 0.5),
            KeywordResult::new("first", 0.7),
            KeywordResult::new("third", 0.5),
        ];
        assert_eq!(format_keywords(set), "FIRST, SECOND, THIRD");
    }

    #[test]
    fn sentinel_becomes_placeholder() {
        let rendered = format_keywords(vec![KeywordResult::sentinel()]);
        assert_eq!(rendered, NO_KEYWORDS_PLACEHOLDER);
        assert!(!rendered.is_empty());
    }

    #[test]
    fn output_positions_follow_input_positions() {
        let results = vec![
            vec![KeywordResult::new("금리", 0.8)],
            vec![KeywordResult::sentinel()],
            vec![KeywordResult::new("nvidia", 0.2), KeywordResult::new("gpu", 0.4)],
        ];
        assert_eq!(
            aggregate(results),
            vec![
                "금리".to_string(),
                NO_KEYWORDS_PLACEHOLDER.to_string(),
                "GPU, NVIDIA".to_string()
            ]
        );
    }

    #[test]
    fn rows_carry_the_article_ids() {
        let documents = vec![
            Document {
                id: ArticleId::Int(30),
                text: "x".to_string(),
            },
            Document {
                id: ArticleId::Int(4),
                text: "y".to_string(),
            },
        ];
        let rows = assemble_rows(&documents, vec!["X".to_string(), "Y".to_string()])
            .expect("lengths match");
        assert_eq!(rows[0].id, ArticleId::Int(30));
        assert_eq!(rows[1].keywords, "Y");

        assert!(assemble_rows(&documents, vec!["X".to_string()]).is_err());
    }
}
