use crate::hacks::{HackSet, PromptHack, MILESTONES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Milestone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    Reached,
    Injected,
    Skipped,
}

impl MilestoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::Reached => "reached",
            MilestoneStatus::Injected => "injected",
            MilestoneStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub percentage: u32,
    pub hack_id: Option<String>,
    pub status: MilestoneStatus,
    pub reached_at: Option<DateTime<Utc>>,
    pub injected_at: Option<DateTime<Utc>>,
}

impl Milestone {
    fn new(percentage: u32, hack_id: Option<String>) -> Self {
        Self {
            percentage,
            hack_id,
            status: MilestoneStatus::Pending,
            reached_at: None,
            injected_at: None,
        }
    }

    pub fn indicator(&self) -> char {
        match self.status {
            MilestoneStatus::Injected => '●',
            MilestoneStatus::Reached => '◐',
            MilestoneStatus::Pending | MilestoneStatus::Skipped => '○',
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressTracker
// ---------------------------------------------------------------------------

/// Tracks task progress and hands out the hack for each newly reached
/// milestone.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    hacks: HackSet,
    current: u64,
    total: u64,
    milestones: Vec<Milestone>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(HackSet::default())
    }
}

impl ProgressTracker {
    pub fn new(hacks: HackSet) -> Self {
        let mut tracker = Self {
            hacks,
            current: 0,
            total: 100,
            milestones: Vec::new(),
        };
        tracker.setup_milestones();
        tracker
    }

    fn setup_milestones(&mut self) {
        self.milestones = MILESTONES
            .iter()
            .map(|&pct| Milestone::new(pct, self.hacks.at_milestone(pct).map(|h| h.id.clone())))
            .collect();
    }

    pub fn hacks(&self) -> &HackSet {
        &self.hacks
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Start over with a new total.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
        self.current = 0;
        self.setup_milestones();
    }

    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    /// Record progress. Every pending milestone now crossed becomes reached;
    /// the first of those with an enabled hack is returned.
    pub fn update_progress(&mut self, current: u64) -> Option<&PromptHack> {
        self.current = current;
        let pct = self.percentage();
        let now = Utc::now();
        let mut first: Option<String> = None;

        for m in self
            .milestones
            .iter_mut()
            .filter(|m| m.status == MilestoneStatus::Pending)
        {
            if pct < f64::from(m.percentage) {
                continue;
            }
            m.status = MilestoneStatus::Reached;
            m.reached_at = Some(now);
            tracing::debug!(milestone = m.percentage, "milestone reached");

            if first.is_none() {
                first = m
                    .hack_id
                    .clone()
                    .filter(|id| self.hacks.is_enabled(id));
            }
        }

        first.and_then(|id| self.hacks.get(&id))
    }

    pub fn increment(&mut self, amount: u64) -> Option<&PromptHack> {
        self.update_progress(self.current.saturating_add(amount))
    }

    pub fn mark_injected(&mut self, percentage: u32) -> bool {
        match self.milestones.iter_mut().find(|m| m.percentage == percentage) {
            Some(m) => {
                m.status = MilestoneStatus::Injected;
                m.injected_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn skip(&mut self, percentage: u32) -> bool {
        match self.milestones.iter_mut().find(|m| m.percentage == percentage) {
            Some(m) => {
                m.status = MilestoneStatus::Skipped;
                true
            }
            None => false,
        }
    }

    /// One-line summary such as `[45%] 20● 40◐ 60○ 80○ 100○`.
    pub fn compact_indicator(&self) -> String {
        let parts: Vec<String> = self
            .milestones
            .iter()
            .map(|m| format!("{}{}", m.percentage, m.indicator()))
            .collect();
        format!("[{}%] {}", self.percentage() as u32, parts.join(" "))
    }

    pub fn injected_count(&self) -> usize {
        self.count(MilestoneStatus::Injected)
    }

    pub fn remaining_count(&self) -> usize {
        self.count(MilestoneStatus::Pending)
    }

    fn count(&self, status: MilestoneStatus) -> usize {
        self.milestones.iter().filter(|m| m.status == status).count()
    }

    pub fn is_complete(&self) -> bool {
        self.percentage() >= 100.0
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.setup_milestones();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
