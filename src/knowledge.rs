//! Keyword Intent Matcher
//!
//! Canned-answer fallback for the biodiversity chat when no LLM provider is
//! configured or a call fails. Classifies a question as in-domain via a fixed
//! keyword list, then picks the best knowledge-base entry by keyword overlap.
//!
//! Matching is substring containment on the lowercased question, not token
//! matching. That keeps compound phrases and word fragments matching without
//! a tokenizer, at the cost of partial-word false positives ("cat" inside
//! "category"). Existing answers depend on that behavior.

/// A static question-topic-to-answer mapping. The set is fixed at compile
/// time; declaration order is the tie-break order.
#[derive(Debug)]
pub struct KnowledgeBaseEntry {
    pub id: &'static str,
    pub keywords: &'static [&'static str],
    pub answer: &'static str,
}

/// Returned verbatim for questions with no domain keyword.
pub const OFF_TOPIC_RESPONSE: &str = "I can only answer questions related to \
    biodiversity. Please ask me something about nature, wildlife, or \
    conservation.";

/// Returned for in-domain questions that match no entry.
pub const NO_MATCH_RESPONSE: &str = "That sounds like a biodiversity \
    question, but I don't have specific information on it. Try asking about \
    the birds, plants, or other wildlife found around Islamabad.";

// Terms marking a question as biodiversity-related. Independent of the entry
// keywords below: an in-domain question can still match no entry.
const DOMAIN_KEYWORDS: &[&str] = &[
    "bird", "plant", "tree", "flower", "animal", "wildlife", "species",
    "ecosystem", "biodiversity", "nature", "insect", "butterfly", "leopard",
    "snake", "conservation", "habitat", "margalla", "rawal", "islamabad",
    "shakarparian", "hills", "lake", "forest", "trail",
];

// All keywords lowercase; the question is lowercased before matching.
pub static KNOWLEDGE_BASE: &[KnowledgeBaseEntry] = &[
    KnowledgeBaseEntry {
        id: "birds_margalla",
        keywords: &["bird", "margalla", "hills", "raptor", "pheasant"],
        answer: "Margalla Hills National Park hosts over 250 bird species. \
            Commonly seen are the Himalayan griffon vulture, kalij pheasant, \
            paradise flycatcher, and white-cheeked bulbul. Early mornings on \
            Trail 3 and Trail 5 are the best time for birdwatching.",
    },
    KnowledgeBaseEntry {
        id: "rawal_lake_waterfowl",
        keywords: &["rawal", "lake", "waterfowl", "duck", "migratory"],
        answer: "Rawal Lake is a key stopover on the Indus flyway. In winter \
            it attracts migratory waterfowl such as mallards, pochards, and \
            coots, alongside resident herons, egrets, and kingfishers around \
            the reed beds.",
    },
    KnowledgeBaseEntry {
        id: "margalla_mammals",
        keywords: &["leopard", "mammal", "boar", "monkey", "fox"],
        answer: "The Margalla range supports common leopards, wild boar, \
            rhesus monkeys, red foxes, and barking deer. Leopards are shy and \
            mostly nocturnal; sightings are rare and should be reported to \
            the wildlife management board.",
    },
    KnowledgeBaseEntry {
        id: "native_flora",
        keywords: &["plant", "tree", "flora", "pine", "olive", "flower"],
        answer: "Native flora of the Islamabad region includes chir pine, \
            wild olive, phulai (Acacia modesta), and snatha shrublands. \
            Spring brings flowering paper mulberry (an invasive allergen) \
            and native silk cotton trees.",
    },
    KnowledgeBaseEntry {
        id: "butterflies_insects",
        keywords: &["butterfly", "butterflies", "insect", "moth", "pollinator"],
        answer: "Over 100 butterfly species have been recorded in the \
            Margalla foothills, including the common mormon, plain tiger, \
            and lime butterfly. They are most active on sunny mornings near \
            flowering shrubs and stream beds.",
    },
    KnowledgeBaseEntry {
        id: "snakes_reptiles",
        keywords: &["snake", "reptile", "lizard", "cobra", "viper"],
        answer: "Reptiles around Islamabad include the Indian cobra, \
            saw-scaled viper, rat snake, and monitor lizard. Most snakes \
            avoid people; keep to trails and give any snake a wide berth \
            rather than attempting to handle it.",
    },
    KnowledgeBaseEntry {
        id: "conservation_help",
        keywords: &["conservation", "protect", "volunteer", "threat"],
        answer: "You can support local conservation by logging sightings, \
            joining Margalla Hills clean-up drives, avoiding single-use \
            plastics on trails, and reporting fires or poaching to the \
            Islamabad Wildlife Management Board helpline (1819).",
    },
];

/// True when the lowercased question contains at least one domain keyword.
fn is_in_domain(question_lower: &str) -> bool {
    DOMAIN_KEYWORDS.iter().any(|kw| question_lower.contains(kw))
}

/// Number of the entry's keywords occurring in the question. A keyword
/// appearing several times still counts once.
fn score_entry(entry: &KnowledgeBaseEntry, question_lower: &str) -> usize {
    entry
        .keywords
        .iter()
        .filter(|kw| question_lower.contains(*kw))
        .count()
}

/// Entry with the strictly highest score, scanning in declaration order.
/// Ties keep the earlier entry. None when every score is zero.
fn best_match<'a>(
    entries: &'a [KnowledgeBaseEntry],
    question_lower: &str,
) -> Option<&'a KnowledgeBaseEntry> {
    let mut best: Option<&KnowledgeBaseEntry> = None;
    let mut best_score = 0usize;

    for entry in entries {
        let score = score_entry(entry, question_lower);
        if score > best_score {
            best_score = score;
            best = Some(entry);
        }
    }

    best
}

/// Outcome of classifying one question.
#[derive(Debug, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// No domain keyword present.
    OffTopic,
    /// Best-scoring knowledge-base entry.
    Entry(&'a KnowledgeBaseEntry),
    /// In-domain, but no entry keyword matched.
    NoMatch,
}

impl PartialEq for KnowledgeBaseEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for KnowledgeBaseEntry {}

/// Classify a question against the compiled-in knowledge base.
pub fn classify(question: &str) -> MatchOutcome<'static> {
    let question_lower = question.to_lowercase();

    if !is_in_domain(&question_lower) {
        return MatchOutcome::OffTopic;
    }

    match best_match(KNOWLEDGE_BASE, &question_lower) {
        Some(entry) => MatchOutcome::Entry(entry),
        None => MatchOutcome::NoMatch,
    }
}

/// Answer text for a question. Total over any input string; always returns
/// exactly one of off-topic, an entry answer, or the generic fallback.
pub fn answer(question: &str) -> &'static str {
    match classify(question) {
        MatchOutcome::OffTopic => OFF_TOPIC_RESPONSE,
        MatchOutcome::Entry(entry) => entry.answer,
        MatchOutcome::NoMatch => NO_MATCH_RESPONSE,
    }
}
