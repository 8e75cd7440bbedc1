//! Prompt construction for card synthesis.

use std::fmt::Write as _;

use crate::core::{Category, PriorItem};
use crate::document::DocumentContent;

/// Section headings whose content describes planned, not required, work.
pub const FUTURE_WORK_HEADINGS: &[&str] = &[
    "Next flows to be planned",
    "Next steps",
    "Future work",
    "Future improvements",
    "Roadmap",
    "Out of scope",
];

/// Build the synthesis prompt for a document.
///
/// Prior items, when present, are listed with an instruction not to
/// duplicate, overlap with, or refine any of them.
pub fn build_prompt(content: &DocumentContent, prior_items: &[PriorItem]) -> String {
    let mut prompt = String::from(
        "You are an assistant specialized in analysing technical software specifications.\n\
         Analyse the specification content below and produce structured development cards.\n\n",
    );

    prompt.push_str("=== SPECIFICATION TEXT ===\n\n");
    prompt.push_str(content.text.trim());
    prompt.push_str("\n\n=== SPECIFICATION TABLES (JSON) ===\n\n");
    prompt.push_str(&content.tables_json());
    prompt.push_str("\n\n");

    if !prior_items.is_empty() {
        prompt.push_str("=== EXISTING ITEMS ===\n\n");
        for (i, item) in prior_items.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {} — {}", i + 1, item.title, item.snippet);
        }
        prompt.push_str(
            "\nThese items already exist in the tracker. Do NOT create any card that duplicates, \
             overlaps in scope with, or is a sub-part or refinement of an existing item. \
             If the specification contains nothing new beyond these items, \
             return an empty array [].\n\n",
        );
    }

    let headings = FUTURE_WORK_HEADINGS
        .iter()
        .map(|h| format!("\"{}\"", h))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = write!(
        prompt,
        "INSTRUCTIONS:
1. Create cards ONLY for requirements explicitly stated in the specification. \
Do not invent, infer or add work that the document does not ask for.
2. Ignore entirely any section whose heading refers to future or planned work \
(for example {headings}). Content from such sections must never produce cards.
3. Classify every card with exactly one type:
   - UI, screens, forms, UX, visual components -> \"{fe}\"
   - API, database/persistence, authentication, business rules, services -> \"{be}\"
4. Make \"description\" and \"acceptance_criteria\" technically concrete: \
name endpoints, components, payloads, fields and validation rules instead of generic statements.
5. Express hierarchy with \"parent_index\": the zero-based index of the parent card \
in YOUR OWN output array. A parent must appear before its children. \
Use null when a card has no parent.

RESPONSE FORMAT:
[
  {{
    \"title\": \"Short card title\",
    \"description\": \"Detailed technical description\",
    \"type\": \"{fe}\" or \"{be}\",
    \"acceptance_criteria\": [\"Criterion 1\", \"Criterion 2\"],
    \"parent_index\": null
  }}
]

IMPORTANT:
- Return ONLY a raw JSON array: no prose, no markdown, no code fences.
- Each object must have exactly the fields: \
title, description, type, acceptance_criteria, parent_index.
- \"type\" must be exactly \"{fe}\" or \"{be}\".
- \"acceptance_criteria\" must be an array of strings.
",
        headings = headings,
        fe = Category::FrontEnd.wire_name(),
        be = Category::BackEnd.wire_name(),
    );

    prompt
}
