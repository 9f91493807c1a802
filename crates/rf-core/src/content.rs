//! Content records exchanged between the pipeline and its collaborators.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Sourced content eligible for conversion into a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub body: String,
    /// The source selector this item came from (e.g. a community name).
    pub source: String,
    pub author: String,
    pub url: String,
    pub popularity_score: i64,
    pub comment_count: u64,
}

impl Default for CandidateItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            body: String::new(),
            source: String::new(),
            author: "[unknown]".into(),
            url: String::new(),
            popularity_score: 0,
            comment_count: 0,
        }
    }
}

/// A candidate after quality assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedCandidate {
    #[serde(flatten)]
    pub item: CandidateItem,
    /// Quality rating in `[1, 10]`.
    pub rating: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl RatedCandidate {
    pub fn new(item: CandidateItem, rating: f64) -> Self {
        Self {
            item,
            rating,
            reasoning: String::new(),
        }
    }

    /// Comments per unit of popularity, guarding against zero popularity.
    pub fn engagement(&self) -> f64 {
        self.item.comment_count as f64 / self.item.popularity_score.max(1) as f64
    }
}

// ---------------------------------------------------------------------------
// Styles and strategies
// ---------------------------------------------------------------------------

/// Recency window for candidate fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    All,
}

/// How the `select` stage picks one candidate out of the assessed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Maximum rating; ties go to the earliest candidate.
    #[default]
    HighestRated,
    /// Maximum popularity score.
    MostPopular,
    /// Maximum `comment_count / max(popularity_score, 1)`.
    BestEngagement,
}

/// Narration style requested from the script writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStyle {
    #[default]
    Engaging,
    Dramatic,
    Casual,
    Story,
}

/// Visual style requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    #[default]
    Modern,
    Minimal,
    Dynamic,
    Story,
}

/// Which speech synthesis service to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthService {
    Primary,
    Secondary,
}

macro_rules! impl_display_via_serde_name {
    ($($ty:ty => { $($variant:path => $name:literal),+ $(,)? }),+ $(,)?) => {
        $(
            impl $ty {
                pub fn as_str(&self) -> &'static str {
                    match self {
                        $($variant => $name),+
                    }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

impl_display_via_serde_name! {
    TimeFilter => {
        TimeFilter::Hour => "hour",
        TimeFilter::Day => "day",
        TimeFilter::Week => "week",
        TimeFilter::Month => "month",
        TimeFilter::Year => "year",
        TimeFilter::All => "all",
    },
    SelectionStrategy => {
        SelectionStrategy::HighestRated => "highest_rated",
        SelectionStrategy::MostPopular => "most_popular",
        SelectionStrategy::BestEngagement => "best_engagement",
    },
    ScriptStyle => {
        ScriptStyle::Engaging => "engaging",
        ScriptStyle::Dramatic => "dramatic",
        ScriptStyle::Casual => "casual",
        ScriptStyle::Story => "story",
    },
    RenderStyle => {
        RenderStyle::Modern => "modern",
        RenderStyle::Minimal => "minimal",
        RenderStyle::Dynamic => "dynamic",
        RenderStyle::Story => "story",
    },
    SynthService => {
        SynthService::Primary => "primary",
        SynthService::Secondary => "secondary",
    },
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Reference to a synthesized narration track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    pub path: PathBuf,
    /// Which service produced this audio.
    pub service: SynthService,
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

/// Reference to a rendered video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRef {
    pub path: PathBuf,
    #[serde(default)]
    pub duration_secs: f64,
}

/// Expected engagement figures attached to a persisted artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformancePrediction {
    pub views: u64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub confidence: f64,
}

/// Metadata returned by the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Final location of the persisted video.
    pub video_path: PathBuf,
    pub caption: String,
    pub tags: Vec<String>,
    pub description: String,
    pub category: String,
    pub predicted_performance: PerformancePrediction,
    /// Anything else the collaborator chose to report.
    pub extra: BTreeMap<String, serde_json::Value>,
}
