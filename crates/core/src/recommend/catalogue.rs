//! Static strategy catalogue

use serde::Serialize;

/// A prompt-optimization strategy the engine can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogueEntry {
    /// Stable identifier, as recorded by the stats provider
    pub name: &'static str,
    /// Display label
    pub label: &'static str,
    /// Task types this strategy is well-suited for
    pub best_for: &'static [&'static str],
    /// Why a user would reach for this strategy
    pub motivation: &'static str,
}

impl CatalogueEntry {
    /// Whether `task_type` is one of this strategy's target task types
    pub fn targets(&self, task_type: &str) -> bool {
        self.best_for.contains(&task_type)
    }
}

pub const CATALOGUE: &[CatalogueEntry] = &[
    CatalogueEntry {
        name: "chain-of-thought",
        label: "Chain of Thought",
        best_for: &["reasoning", "math", "analysis"],
        motivation: "Makes the model show intermediate reasoning before committing to an answer.",
    },
    CatalogueEntry {
        name: "co-star",
        label: "CO-STAR",
        best_for: &["writing", "creative", "general"],
        motivation: "Frames context, objective, style, tone, audience and response format up front.",
    },
    CatalogueEntry {
        name: "risen",
        label: "RISEN",
        best_for: &["research", "extraction", "general"],
        motivation: "Structures role, instructions, steps, end goal and narrowing constraints.",
    },
    CatalogueEntry {
        name: "role-task-format",
        label: "Role-Task-Format",
        best_for: &["writing", "formatting", "education"],
        motivation: "Pins down who answers, what they do and the exact shape of the output.",
    },
    CatalogueEntry {
        name: "few-shot-scoring",
        label: "Few-Shot Scoring",
        best_for: &["classification", "extraction"],
        motivation: "Anchors the model with scored examples so labels stay consistent.",
    },
    CatalogueEntry {
        name: "structured-output",
        label: "Structured Output",
        best_for: &["coding", "extraction", "formatting"],
        motivation: "Forces machine-readable output with an explicit schema.",
    },
    CatalogueEntry {
        name: "step-by-step",
        label: "Step by Step",
        best_for: &["coding", "math", "education"],
        motivation: "Breaks the task into ordered, verifiable steps.",
    },
    CatalogueEntry {
        name: "constraint-injection",
        label: "Constraint Injection",
        best_for: &["coding", "legal", "medical"],
        motivation: "States hard requirements and forbidden moves explicitly.",
    },
    CatalogueEntry {
        name: "context-enrichment",
        label: "Context Enrichment",
        best_for: &["research", "medical", "legal"],
        motivation: "Supplies background material the model would otherwise have to guess.",
    },
    CatalogueEntry {
        name: "persona-assignment",
        label: "Persona Assignment",
        best_for: &["creative", "education", "general"],
        motivation: "Gives the model an expert voice matched to the audience.",
    },
];

/// Look up a catalogue entry by its identifier
pub fn find_entry(name: &str) -> Option<&'static CatalogueEntry> {
    CATALOGUE.iter().find(|entry| entry.name == name)
}

/// Identifiers of every catalogue strategy, in catalogue order
pub fn catalogue_names() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|entry| entry.name)
}
