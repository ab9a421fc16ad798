use crate::dataset::{Dataset, Id, Play};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    Or,
    And,
}

impl Combinator {
    pub fn toggled(self) -> Combinator {
        match self {
            Combinator::Or => Combinator::And,
            Combinator::And => Combinator::Or,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Combinator::Or => "OR",
            Combinator::And => "AND",
        }
    }
}

/// One filter dimension, used to build the neutral selection that ignores
/// exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Year,
    Duration,
    Location,
    Player,
    GameType,
}

/// User-selected criteria. Every field is optional in the sense that its
/// empty/default state constrains nothing.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub year: Option<String>,
    pub min_duration_min: Option<u32>,
    pub max_duration_min: Option<u32>,
    pub locations: Vec<Id>,
    pub location_mode: Combinator,
    pub players: Vec<Id>,
    pub player_mode: Combinator,
    pub include_competitive: bool,
    pub include_coop: bool,
    /// Post-aggregation row threshold on lifetime (neutral) play counts.
    pub min_plays: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            year: None,
            min_duration_min: None,
            max_duration_min: None,
            locations: Vec::new(),
            location_mode: Combinator::Or,
            players: Vec::new(),
            player_mode: Combinator::Or,
            include_competitive: true,
            include_coop: true,
            min_plays: 0,
        }
    }
}

impl FilterCriteria {
    pub fn matches(&self, dataset: &Dataset, play: &Play) -> bool {
        self.matches_excluding(dataset, play, None)
    }

    /// Total predicate over one play; each dimension short-circuits. `skip`
    /// leaves one dimension out for neutral totals.
    pub fn matches_excluding(
        &self,
        dataset: &Dataset,
        play: &Play,
        skip: Option<FilterDimension>,
    ) -> bool {
        if skip != Some(FilterDimension::Year) && !self.matches_year(play) {
            return false;
        }
        if skip != Some(FilterDimension::Duration) && !self.matches_duration(play) {
            return false;
        }
        if skip != Some(FilterDimension::Location) && !self.matches_location(play) {
            return false;
        }
        if skip != Some(FilterDimension::Player) && !self.matches_players(play) {
            return false;
        }
        if skip != Some(FilterDimension::GameType) && !self.matches_game_type(dataset, play) {
            return false;
        }
        true
    }

    fn matches_year(&self, play: &Play) -> bool {
        let Some(year) = &self.year else {
            return true;
        };
        // A play whose date never parsed has no year and fails the filter.
        play.year().is_some_and(|y| y.to_string() == *year)
    }

    fn matches_duration(&self, play: &Play) -> bool {
        if self.min_duration_min.is_none() && self.max_duration_min.is_none() {
            return true;
        }
        // Unknown duration fails any set bound; it is not zero.
        let Some(dur) = play.duration_min else {
            return false;
        };
        if self.min_duration_min.is_some_and(|min| dur < min) {
            return false;
        }
        if self.max_duration_min.is_some_and(|max| dur > max) {
            return false;
        }
        true
    }

    fn matches_location(&self, play: &Play) -> bool {
        if self.locations.is_empty() {
            return true;
        }
        match self.location_mode {
            Combinator::Or => play
                .location_ref_id
                .is_some_and(|loc| self.locations.contains(&loc)),
            // A play has exactly one location, so AND is satisfiable only
            // with a single selected location; two or more selected matches
            // no play.
            Combinator::And => {
                self.locations.len() == 1 && play.location_ref_id == Some(self.locations[0])
            }
        }
    }

    fn matches_players(&self, play: &Play) -> bool {
        if self.players.is_empty() {
            return true;
        }
        match self.player_mode {
            Combinator::Or => self
                .players
                .iter()
                .any(|id| play.participant_ids().any(|p| p == *id)),
            Combinator::And => self
                .players
                .iter()
                .all(|id| play.participant_ids().any(|p| p == *id)),
        }
    }

    fn matches_game_type(&self, dataset: &Dataset, play: &Play) -> bool {
        if dataset.play_is_coop(play) {
            self.include_coop
        } else {
            self.include_competitive
        }
    }
}

/// Filtered working set, in dataset order.
pub fn select_plays<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> Vec<&'a Play> {
    dataset
        .plays
        .iter()
        .filter(|play| criteria.matches(dataset, play))
        .collect()
}

/// Neutral working set: every dimension except the coop/competitive toggle.
/// Lifetime totals and the minimum-plays threshold read from this set, so
/// toggling game-type inclusion never changes them.
pub fn select_neutral_plays<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> Vec<&'a Play> {
    dataset
        .plays
        .iter()
        .filter(|play| criteria.matches_excluding(dataset, play, Some(FilterDimension::GameType)))
        .collect()
}
