//! Bulletin creation wizard
//!
//! An explicit state machine: `Count -> Details -> Review -> Complete`.
//! Forward transitions are guarded; a refused transition leaves the wizard
//! where it was and reports why.

use chrono::{DateTime, Utc};

use crate::model::{self, BetMarket, BettingType, Bulletin, Game, GameStatus, Team};
use crate::sports::default_league;
use crate::{Error, Result};

/// Odds given to freshly created games.
pub const DEFAULT_ODDS: f64 = 2.0;

/// Stake suggested for multiple bulletins.
pub const DEFAULT_STAKE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Count,
    Details,
    Review,
    Complete,
}

impl WizardStep {
    /// 1-based position shown in the progress indicator.
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Count => 1,
            WizardStep::Details => 2,
            WizardStep::Review => 3,
            WizardStep::Complete => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Wizard {
    kind: BettingType,
    step: WizardStep,
    count: usize,
    games: Vec<Game>,
    stake: Option<f64>,
    bookmaker_name: Option<String>,
    bookmaker_logo_url: Option<String>,
}

fn blank_game(index: usize) -> Game {
    Game {
        id: format!("game-{}", index + 1),
        league: default_league(),
        home_team: Team::named(0, ""),
        away_team: Team::named(0, ""),
        market: BetMarket::default(),
        odds: DEFAULT_ODDS,
        kickoff: None,
        selection: None,
        status: Some(GameStatus::Pending),
    }
}

impl Wizard {
    pub fn new(kind: BettingType) -> Self {
        Self {
            kind,
            step: WizardStep::Count,
            count: 1,
            games: Vec::new(),
            stake: kind.is_multiple().then_some(DEFAULT_STAKE),
            bookmaker_name: None,
            bookmaker_logo_url: None,
        }
    }

    pub fn kind(&self) -> BettingType {
        self.kind
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    fn expect_step(&self, expected: WizardStep, action: &str) -> Result<()> {
        if self.step != expected {
            return Err(Error::InvalidStep(format!(
                "cannot {} in step {:?} (expected {:?})",
                action, self.step, expected
            )));
        }
        Ok(())
    }

    /// Choose how many games the bulletin has (1..=max for the type).
    pub fn set_count(&mut self, count: usize) -> Result<()> {
        self.expect_step(WizardStep::Count, "set the game count")?;
        let max = self.kind.max_games();
        if count == 0 || count > max {
            return Err(Error::Validation(vec![format!(
                "game count must be between 1 and {} for {} bulletins",
                max, self.kind
            )]));
        }
        self.count = count;
        Ok(())
    }

    /// Advance one step. From `Details` this validates every game and stays
    /// put on failure. `Review` is left through [`finish`](Self::finish).
    pub fn next(&mut self) -> Result<WizardStep> {
        match self.step {
            WizardStep::Count => {
                // keep edits when coming back from Details with the same count
                if self.games.len() != self.count {
                    self.games = (0..self.count).map(blank_game).collect();
                }
                self.step = WizardStep::Details;
            }
            WizardStep::Details => {
                let problems = self.validation_errors();
                if !problems.is_empty() {
                    return Err(Error::Validation(problems));
                }
                self.step = WizardStep::Review;
            }
            WizardStep::Review => {
                return Err(Error::InvalidStep("use finish() to complete the review step".into()));
            }
            WizardStep::Complete => {
                return Err(Error::InvalidStep("wizard already complete".into()));
            }
        }
        Ok(self.step)
    }

    /// Step back; a no-op at `Count` and after completion.
    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Count | WizardStep::Details => WizardStep::Count,
            WizardStep::Review => WizardStep::Details,
            WizardStep::Complete => WizardStep::Complete,
        };
        self.step
    }

    /// Mutable access to a game while in `Details`.
    pub fn game_mut(&mut self, index: usize) -> Result<&mut Game> {
        self.expect_step(WizardStep::Details, "edit games")?;
        let len = self.games.len();
        self.games
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("game index {} (have {})", index, len)))
    }

    /// Replace a game wholesale, keeping its id.
    pub fn update_game(&mut self, index: usize, mut game: Game) -> Result<()> {
        let slot = self.game_mut(index)?;
        game.id = slot.id.clone();
        *slot = game;
        Ok(())
    }

    /// Blocking problems for the current games.
    pub fn validation_errors(&self) -> Vec<String> {
        self.games
            .iter()
            .enumerate()
            .flat_map(|(i, g)| g.validate(i + 1))
            .collect()
    }

    /// Non-blocking notes (low odds).
    pub fn warnings(&self) -> Vec<String> {
        self.games
            .iter()
            .enumerate()
            .filter(|(_, g)| g.is_low_odds())
            .map(|(i, g)| format!("game {}: low odds ({})", i + 1, model::format_decimal(g.odds)))
            .collect()
    }

    /// Set the stake during review. Ignored for simple types.
    pub fn set_stake(&mut self, stake: Option<f64>) -> Result<()> {
        self.expect_step(WizardStep::Review, "set the stake")?;
        if !self.kind.is_multiple() {
            log::debug!("stake ignored for {} bulletin", self.kind);
            return Ok(());
        }
        if let Some(s) = stake {
            if !s.is_finite() || s <= 0.0 {
                return Err(Error::Validation(vec!["stake must be a positive amount".into()]));
            }
        }
        self.stake = stake;
        Ok(())
    }

    pub fn stake(&self) -> Option<f64> {
        if self.kind.is_multiple() {
            self.stake
        } else {
            None
        }
    }

    pub fn set_bookmaker(&mut self, name: Option<String>, logo_url: Option<String>) {
        self.bookmaker_name = name.filter(|n| !n.trim().is_empty());
        self.bookmaker_logo_url = logo_url.filter(|u| !u.trim().is_empty());
    }

    pub fn total_odds(&self) -> f64 {
        model::total_odds(&self.games)
    }

    pub fn potential_return(&self) -> Option<f64> {
        self.stake().filter(|s| *s > 0.0).map(|s| s * self.total_odds())
    }

    /// Build the bulletin and move to `Complete`.
    pub fn finish(&mut self, id: impl Into<String>, created_at: DateTime<Utc>) -> Result<Bulletin> {
        self.expect_step(WizardStep::Review, "finish")?;
        let mut bulletin = Bulletin::new(id, self.kind, self.games.clone(), self.stake(), created_at);
        if let Some(name) = &self.bookmaker_name {
            bulletin = bulletin.with_bookmaker(name.clone(), self.bookmaker_logo_url.clone());
        }
        self.step = WizardStep::Complete;
        log::info!(
            "bulletin {} created: {} game(s), total odds {}",
            bulletin.id,
            bulletin.games.len(),
            model::format_decimal(bulletin.total_odds)
        );
        Ok(bulletin)
    }

    /// Drive the wizard in one go from a list of prepared games.
    pub fn build(
        kind: BettingType,
        games: Vec<Game>,
        stake: Option<f64>,
        bookmaker: Option<(String, Option<String>)>,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<(Bulletin, Vec<String>)> {
        let mut wizard = Wizard::new(kind);
        wizard.set_count(games.len())?;
        wizard.next()?;
        for (i, game) in games.into_iter().enumerate() {
            wizard.update_game(i, game)?;
        }
        wizard.next()?;
        if stake.is_some() {
            wizard.set_stake(stake)?;
        }
        if let Some((name, logo)) = bookmaker {
            wizard.set_bookmaker(Some(name), logo);
        }
        let warnings = wizard.warnings();
        let bulletin = wizard.finish(id, created_at)?;
        Ok((bulletin, warnings))
    }
}
