//! Cursor-driven visibility of goals over a day range.
//!
//! Moving the day cursor creates bubbles for goals whose range contains the
//! day, fades them in over their first days, and removes goals whose range
//! no longer contains it.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    bubble::Preset,
    color,
    config::TimelineConfig,
    error::DatasetError,
    scene::Scene,
};

/// Half-open day interval `[low, high)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayRange {
    pub low: f32,
    pub high: f32,
}

impl DayRange {
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, day: f32) -> bool {
        self.low <= day && day < self.high
    }

    fn is_inverted(&self) -> bool {
        self.low.is_nan() || self.high.is_nan() || self.low > self.high
    }
}

/// A sub-activity of a goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub name: String,
    pub day_range_low: f32,
    pub day_range_high: f32,
    pub preset: Preset,
}

impl Habit {
    pub fn new(name: impl Into<String>, low: f32, high: f32, preset: Preset) -> Self {
        Self {
            name: name.into(),
            day_range_low: low,
            day_range_high: high,
            preset,
        }
    }

    pub fn range(&self) -> DayRange {
        DayRange::new(self.day_range_low, self.day_range_high)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub name: String,
    pub day_range_low: f32,
    pub day_range_high: f32,
    #[serde(default)]
    pub habits: Vec<Habit>,
}

impl Goal {
    pub fn new(name: impl Into<String>, low: f32, high: f32, habits: Vec<Habit>) -> Self {
        Self {
            name: name.into(),
            day_range_low: low,
            day_range_high: high,
            habits,
        }
    }

    pub fn range(&self) -> DayRange {
        DayRange::new(self.day_range_low, self.day_range_high)
    }
}

/// An ordered, validated list of goals.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    goals: Vec<Goal>,
}

impl Dataset {
    /// Validates `goals`: names are non-empty and unique, and no range is
    /// inverted.
    pub fn new(goals: Vec<Goal>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for (index, goal) in goals.iter().enumerate() {
            if goal.name.trim().is_empty() {
                return Err(DatasetError::EmptyName(index));
            }
            if !seen.insert(goal.name.as_str()) {
                return Err(DatasetError::DuplicateGoal(goal.name.clone()));
            }
            if goal.range().is_inverted() {
                return Err(DatasetError::InvertedGoalRange {
                    name: goal.name.clone(),
                    low: goal.day_range_low,
                    high: goal.day_range_high,
                });
            }
            if let Some(habit) = goal.habits.iter().find(|h| h.range().is_inverted()) {
                return Err(DatasetError::InvertedHabitRange {
                    goal: goal.name.clone(),
                    habit: habit.name.clone(),
                    low: habit.day_range_low,
                    high: habit.day_range_high,
                });
            }
        }
        Ok(Self { goals })
    }

    /// Parses a JSON array of goal records.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let goals: Vec<Goal> = serde_json::from_str(json)?;
        Self::new(goals)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).inspect_err(|err| warn!(%err, "dataset rejected"))
    }

    /// Three goals spread across a year, three habits each.
    pub fn demo() -> Self {
        let goals = vec![
            Goal::new(
                "Old Aim",
                20.0,
                366.0,
                vec![
                    Habit::new("1", 20.0, 366.0, Preset::Sport),
                    Habit::new("2", 23.0, 366.0, Preset::Read),
                    Habit::new("3", 25.0, 366.0, Preset::Water),
                ],
            ),
            Goal::new(
                "Today Aim",
                187.0,
                366.0,
                vec![
                    Habit::new("4", 187.0, 366.0, Preset::Water),
                    Habit::new("5", 189.0, 366.0, Preset::Read),
                    Habit::new("6", 193.0, 366.0, Preset::Sport),
                ],
            ),
            Goal::new(
                "Future Aim",
                320.0,
                366.0,
                vec![
                    Habit::new("7", 320.0, 366.0, Preset::Sport),
                    Habit::new("8", 326.0, 366.0, Preset::Read),
                    Habit::new("9", 338.0, 365.0, Preset::Sport),
                ],
            ),
        ];
        Self { goals }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }
}

/// A habit in range for the current day, offered for attachment.
#[derive(Clone, Debug, PartialEq)]
pub struct HabitCandidate {
    pub goal: String,
    pub habit: String,
    pub preset: Preset,
}

/// What one cursor move decided.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CursorUpdate {
    pub day: f32,
    /// In-range goals with the alpha applied to each.
    pub in_range: Vec<(String, f32)>,
    pub out_of_range: Vec<String>,
    pub candidates: Vec<HabitCandidate>,
}

#[derive(Clone, Debug)]
pub struct TimeRangeEngine {
    dataset: Dataset,
    config: TimelineConfig,
    day: Option<f32>,
}

impl TimeRangeEngine {
    pub fn new(dataset: Dataset, config: TimelineConfig) -> Self {
        Self {
            dataset,
            config,
            day: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The day last passed to [`TimeRangeEngine::set_cursor`], rounded.
    pub fn day(&self) -> Option<f32> {
        self.day
    }

    /// Opacity of a goal `day` days into a range starting at `low`, rounded
    /// to one decimal.
    pub fn fade_alpha(&self, day: f32, low: f32) -> f32 {
        let alpha = ((day - low) / self.config.max_fade_distance).clamp(0.0, 1.0);
        (alpha * 10.0).round() / 10.0
    }

    /// Moves the cursor to `value` and brings the scene in line with it.
    pub fn set_cursor(&mut self, scene: &mut Scene, value: f32) -> CursorUpdate {
        let day = value.round();
        self.day = Some(day);
        let mut update = CursorUpdate {
            day,
            ..CursorUpdate::default()
        };

        for goal in &self.dataset.goals {
            let range = goal.range();
            if !range.contains(day) {
                if scene.remove_named(&goal.name) {
                    debug!(goal = %goal.name, day, "goal left its range");
                }
                update.out_of_range.push(goal.name.clone());
                continue;
            }

            if scene.find(&goal.name).is_some_and(|b| b.is_removing()) {
                if scene.revive(&goal.name) {
                    debug!(goal = %goal.name, day, "goal came back before leaving");
                }
            } else if !scene.contains(&goal.name) {
                let fill = color::random_color(scene.rng());
                let radius = scene.config().default_radius;
                if scene.add(goal.name.clone(), fill, radius).is_some() {
                    debug!(goal = %goal.name, day, "goal entered its range");
                }
            }
            let alpha = self.fade_alpha(day, range.low);
            scene.update_alpha(&goal.name, alpha);
            update.in_range.push((goal.name.clone(), alpha));

            update.candidates.extend(
                goal.habits
                    .iter()
                    .filter(|h| h.range().contains(day))
                    .map(|h| HabitCandidate {
                        goal: goal.name.clone(),
                        habit: h.name.clone(),
                        preset: h.preset,
                    }),
            );
        }
        update
    }

    /// Attaches each candidate habit to its goal's bubble, once per habit.
    ///
    /// Returns how many children were added.
    pub fn attach_candidates(&self, scene: &mut Scene, update: &CursorUpdate) -> usize {
        let mut added = 0;
        for candidate in &update.candidates {
            let attached = scene.find(&candidate.goal).is_some_and(|b| {
                b.children()
                    .iter()
                    .any(|c| c.tag.as_deref() == Some(candidate.habit.as_str()))
            });
            if attached {
                continue;
            }
            if scene
                .add_tagged_child(&candidate.goal, candidate.preset, &candidate.habit)
                .is_some()
            {
                added += 1;
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn scene() -> Scene {
        Scene::new(SceneConfig {
            seed: Some(3),
            ..SceneConfig::default()
        })
    }

    fn engine(goals: Vec<Goal>) -> TimeRangeEngine {
        TimeRangeEngine::new(Dataset::new(goals).unwrap(), TimelineConfig::default())
    }

    #[test]
    fn day_range_is_half_open() {
        let range = DayRange::new(187.0, 366.0);
        assert!(!range.contains(186.0));
        assert!(range.contains(187.0));
        assert!(range.contains(365.0));
        assert!(!range.contains(366.0));
    }

    #[test]
    fn fade_alpha_is_clamped_and_rounded() {
        let engine = engine(vec![]);
        assert_eq!(engine.fade_alpha(190.0, 187.0), 0.3);
        assert_eq!(engine.fade_alpha(187.0, 187.0), 0.0);
        assert_eq!(engine.fade_alpha(197.0, 187.0), 1.0);
        assert_eq!(engine.fade_alpha(250.0, 187.0), 1.0);
        assert_eq!(engine.fade_alpha(180.0, 187.0), 0.0);
        assert_eq!(engine.fade_alpha(1.26, 0.0), 0.1);

        for day in 0..40 {
            let a = engine.fade_alpha(day as f32 * 0.7, 3.0);
            assert!((0.0..=1.0).contains(&a));
            assert!(((a * 10.0) - (a * 10.0).round()).abs() < 1e-5);
        }
    }

    #[test]
    fn goal_appears_fades_and_leaves_with_the_cursor() {
        let mut scene = scene();
        let mut engine = engine(vec![Goal::new("G", 187.0, 366.0, vec![])]);

        engine.set_cursor(&mut scene, 180.0);
        assert!(!scene.contains("G"));

        let update = engine.set_cursor(&mut scene, 187.0);
        assert_eq!(update.in_range, vec![("G".to_string(), 0.0)]);
        assert_eq!(scene.find("G").unwrap().target_alpha(), 0.0);
        scene.tick(1.0);
        assert_eq!(scene.find("G").unwrap().alpha(), 0.0);

        engine.set_cursor(&mut scene, 196.6);
        assert_eq!(engine.day(), Some(197.0));
        scene.tick(1.0);
        assert_eq!(scene.find("G").unwrap().alpha(), 1.0);
        assert_eq!(scene.len(), 1);

        let update = engine.set_cursor(&mut scene, 400.0);
        assert_eq!(update.out_of_range, vec!["G".to_string()]);
        scene.tick(1.0);
        assert!(!scene.contains("G"));
    }

    #[test]
    fn scrubbing_back_before_the_exit_finishes_keeps_the_goal() {
        let mut scene = scene();
        let mut engine = engine(vec![Goal::new("G", 187.0, 366.0, vec![])]);

        engine.set_cursor(&mut scene, 200.0);
        scene.tick(1.0);
        engine.set_cursor(&mut scene, 400.0);
        scene.tick(0.05);
        let update = engine.set_cursor(&mut scene, 200.0);
        scene.tick(1.0);

        assert_eq!(update.in_range, vec![("G".to_string(), 1.0)]);
        let goal = scene.find("G").unwrap();
        assert!(!goal.is_removing());
        assert_eq!(goal.alpha(), 1.0);
        assert_eq!(goal.scale(), 1.0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn candidates_follow_habit_ranges_and_attach_once() {
        let mut scene = scene();
        let mut engine = TimeRangeEngine::new(Dataset::demo(), TimelineConfig::default());

        let update = engine.set_cursor(&mut scene, 190.0);
        let names: Vec<&str> = update.candidates.iter().map(|c| c.habit.as_str()).collect();
        assert_eq!(names, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(update.out_of_range, vec!["Future Aim".to_string()]);
        assert!(scene.find("Today Aim").unwrap().children().is_empty());

        assert_eq!(engine.attach_candidates(&mut scene, &update), 5);
        assert_eq!(engine.attach_candidates(&mut scene, &update), 0);
        assert_eq!(scene.find("Old Aim").unwrap().children().len(), 3);
        assert_eq!(scene.find("Today Aim").unwrap().radius(), 150.0);

        let update = engine.set_cursor(&mut scene, 193.0);
        assert_eq!(engine.attach_candidates(&mut scene, &update), 1);
        let today = scene.find("Today Aim").unwrap();
        assert_eq!(today.children().len(), 3);
        assert_eq!(today.children()[2].preset, Preset::Sport);
    }

    #[test]
    fn dataset_rejects_bad_input() {
        let inverted = Dataset::new(vec![Goal::new("G", 10.0, 5.0, vec![])]);
        assert!(matches!(
            inverted,
            Err(DatasetError::InvertedGoalRange { ref name, .. }) if name == "G"
        ));

        let habit = Dataset::new(vec![Goal::new(
            "G",
            0.0,
            5.0,
            vec![Habit::new("h", 3.0, 1.0, Preset::Read)],
        )]);
        assert!(matches!(habit, Err(DatasetError::InvertedHabitRange { .. })));

        let dup = Dataset::new(vec![
            Goal::new("G", 0.0, 5.0, vec![]),
            Goal::new("G", 1.0, 5.0, vec![]),
        ]);
        assert!(matches!(dup, Err(DatasetError::DuplicateGoal(_))));

        let empty = Dataset::new(vec![Goal::new(" ", 0.0, 5.0, vec![])]);
        assert!(matches!(empty, Err(DatasetError::EmptyName(0))));

        assert!(matches!(
            Dataset::from_json_str("{"),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn dataset_parses_json_records() {
        let json = r#"[
            {
                "name": "Run a marathon",
                "dayRangeLow": 10,
                "dayRangeHigh": 200,
                "habits": [
                    {"name": "long run", "dayRangeLow": 12, "dayRangeHigh": 190, "preset": "sport"}
                ]
            },
            {"name": "Hydrate", "dayRangeLow": 0, "dayRangeHigh": 366}
        ]"#;

        let dataset = Dataset::from_json_str(json).unwrap();

        assert_eq!(dataset.goals().len(), 2);
        assert_eq!(dataset.goals()[0].range(), DayRange::new(10.0, 200.0));
        assert_eq!(dataset.goals()[0].habits[0].preset, Preset::Sport);
        assert!(dataset.goals()[1].habits.is_empty());
    }

    #[test]
    fn demo_dataset_is_valid() {
        let demo = Dataset::demo();
        assert_eq!(Dataset::new(demo.goals().to_vec()).unwrap(), demo);
    }
}
