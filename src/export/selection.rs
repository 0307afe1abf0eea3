//! Selection of the texts and objects taking part in a run.

use std::collections::HashSet;

use crate::model::{
    CitationSelection, Object, ObjectSelection, Profile, ProjectSource, Text,
    TextObjectSelection, TextSelection,
};

/// The four selection sets of one run, computed once at its start.
pub struct Selection<'a> {
    /// Texts to export, in corpus order
    pub texts: Vec<&'a Text>,
    /// Texts searched for citations
    pub citation_texts: Vec<&'a Text>,
    /// Objects whose references survive inside exported text content
    pub text_objects: HashSet<&'a str>,
    /// Objects exported standalone, in tree order
    pub objects: Vec<&'a Object>,
}

impl<'a> Selection<'a> {
    /// Evaluate the profile's selection filters against a corpus.
    pub fn compute(source: &'a dyn ProjectSource, profile: &Profile) -> Self {
        let corpus = source.corpus_texts();

        let texts: Vec<&Text> = match profile.texts {
            TextSelection::All => corpus.clone(),
            TextSelection::Checked => corpus.iter().copied().filter(|t| t.checked).collect(),
        };

        let citation_texts = match profile.citation_texts {
            CitationSelection::All => corpus,
            CitationSelection::Checked => corpus.into_iter().filter(|t| t.checked).collect(),
            CitationSelection::CoveredByExportedTexts => texts.clone(),
        };

        let all_objects = source.objects();

        let text_objects = all_objects
            .iter()
            .filter(|o| match profile.text_objects {
                TextObjectSelection::All => true,
                TextObjectSelection::Checked => o.checked,
            })
            .map(|o| o.id.as_str())
            .collect();

        let objects = match profile.objects {
            ObjectSelection::All => all_objects,
            ObjectSelection::Checked => all_objects.into_iter().filter(|o| o.checked).collect(),
            ObjectSelection::Used => {
                let used: HashSet<&str> = texts
                    .iter()
                    .flat_map(|t| t.delta.referenced_objects())
                    .collect();
                // tree order, not discovery order
                all_objects
                    .into_iter()
                    .filter(|o| used.contains(o.id.as_str()))
                    .collect()
            }
        };

        log::debug!(
            "Selected {} texts, {} citation texts, {} objects",
            texts.len(),
            citation_texts.len(),
            objects.len()
        );

        Self {
            texts,
            citation_texts,
            text_objects,
            objects,
        }
    }

    /// Check if references to an object are kept in exported text content.
    pub fn keeps_text_object(&self, id: &str) -> bool {
        self.text_objects.contains(id)
    }
}
