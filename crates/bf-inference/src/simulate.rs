//! Synthetic choice and response-time generation.
//!
//! Each simulated trial sets up one game: six category/color items with
//! signed rewards, then single-feature offers the agent must accept or
//! reject. An episodic agent answers each offer by sequentially recalling
//! stored items under a time budget; a feature-value agent answers at a
//! fixed latency from cached per-feature reward sums. Both agents play
//! identical games, so the resulting trial tables have a known generating
//! process for the cross-validated comparison to recover.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use bf_core::{Column, Dataset, Error, Result};

const CATEGORIES: [&str; 4] = ["Food", "Object", "Scene", "Animal"];
const COLORS: [&str; 4] = ["Blue", "Green", "Red", "Yellow"];

/// Games generated per block; each trial plays one of them.
const GAMES_PER_BLOCK: usize = 8;

/// Fixed response time of the feature-value agent.
const FEATURE_RT: f64 = 2.0;

/// One encoded item: a category/color pair with a signed reward.
#[derive(Debug, Clone)]
pub struct Item {
    /// Category feature (e.g. "Food").
    pub category: String,
    /// Color feature (e.g. "Blue").
    pub color: String,
    /// Signed reward attached to the pair.
    pub reward: f64,
}

impl Item {
    fn matches(&self, offer: &str) -> bool {
        self.category == offer || self.color == offer
    }
}

#[derive(Debug, Clone, Copy)]
enum Cue {
    Category,
    Color,
}

struct Game {
    items: Vec<Item>,
    offers: Vec<String>,
}

impl Game {
    fn true_value(&self, offer: &str) -> f64 {
        self.items.iter().filter(|it| it.matches(offer)).map(|it| it.reward).sum()
    }
}

/// Draw six rewards from {-2, -1, 1, 2}, three positive and three negative,
/// such that every feature's reward sum is nonzero and the sums carry mixed
/// signs. Rejection sampled; the constraint set is loose enough that this
/// terminates quickly.
fn draw_reward_set<R: Rng>(rng: &mut R) -> [f64; 6] {
    const LEVELS: [f64; 4] = [-2.0, -1.0, 1.0, 2.0];
    loop {
        let mut v = [0.0; 6];
        for slot in v.iter_mut() {
            *slot = LEVELS[rng.gen_range(0..LEVELS.len())];
        }
        if v.iter().filter(|x| **x > 0.0).count() != 3 {
            continue;
        }
        // Feature sums under the 3/2/1 item layout below: three category
        // groups, then three color groups.
        let groups = [
            v[0] + v[1] + v[2],
            v[3] + v[4],
            v[5],
            v[0] + v[3] + v[5],
            v[1] + v[4],
            v[2],
        ];
        let any_neg = groups.iter().any(|g| *g < 0.0);
        let any_pos = groups.iter().any(|g| *g > 0.0);
        let none_zero = groups.iter().all(|g| *g != 0.0);
        if any_neg && any_pos && none_zero {
            return v;
        }
    }
}

/// Three items share the first category, two the second, one the third;
/// colors repeat in the same 3/2/1 pattern, so each game exposes three
/// category features and three color features.
fn generate_game<R: Rng>(cue: Cue, rng: &mut R) -> Game {
    let mut cats: Vec<&str> = CATEGORIES.to_vec();
    cats.shuffle(rng);
    let mut cols: Vec<&str> = COLORS.to_vec();
    cols.shuffle(rng);

    let rewards = draw_reward_set(rng);
    let slots = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (2, 0)];
    let items = slots
        .iter()
        .zip(rewards)
        .map(|(&(ci, ki), reward)| Item {
            category: cats[ci].to_string(),
            color: cols[ki].to_string(),
            reward,
        })
        .collect();

    let offers = match cue {
        Cue::Category => cats[..3].iter().map(|s| s.to_string()).collect(),
        Cue::Color => cols[..3].iter().map(|s| s.to_string()).collect(),
    };
    Game { items, offers }
}

/// Outcome of one episodic decision.
#[derive(Debug, Clone, Copy)]
pub struct EpisodicDecision {
    /// Whether the offer was accepted (summed recalled value above zero).
    pub accepted: bool,
    /// Elapsed time: non-decision time plus recall time per retrieved item.
    pub rt: f64,
    /// Number of items retrieved before stopping.
    pub n_recalled: u32,
    /// Noisy sum of rewards from retrieved items matching the offer.
    pub recalled_value: f64,
}

/// Decides by sampling stored episodes in random order until a stop rule
/// or the decision deadline fires, accumulating noisy rewards from
/// episodes that share a feature with the offer.
pub struct EpisodicAgent {
    non_decision_time: f64,
    recall_time: f64,
    p_stop: f64,
    max_decision_time: f64,
    noise: Normal<f64>,
    episodes: Vec<Item>,
}

impl EpisodicAgent {
    /// Create an agent; all timing parameters are validated up front.
    pub fn new(
        non_decision_time: f64,
        recall_time: f64,
        recall_noise: f64,
        p_stop: f64,
        max_decision_time: f64,
    ) -> Result<Self> {
        if !non_decision_time.is_finite() || non_decision_time < 0.0 {
            return Err(Error::Validation(format!(
                "non_decision_time must be finite and non-negative, got {}",
                non_decision_time
            )));
        }
        if !recall_time.is_finite() || recall_time <= 0.0 {
            return Err(Error::Validation(format!(
                "recall_time must be finite and positive, got {}",
                recall_time
            )));
        }
        if !p_stop.is_finite() || p_stop <= 0.0 || p_stop > 1.0 {
            return Err(Error::Validation(format!(
                "p_stop must lie in (0, 1], got {}",
                p_stop
            )));
        }
        if !max_decision_time.is_finite() || max_decision_time <= non_decision_time {
            return Err(Error::Validation(format!(
                "max_decision_time must exceed non_decision_time, got {}",
                max_decision_time
            )));
        }
        let noise = Normal::new(0.0, recall_noise).map_err(|e| {
            Error::Validation(format!("recall_noise must be finite and non-negative: {}", e))
        })?;
        Ok(Self {
            non_decision_time,
            recall_time,
            p_stop,
            max_decision_time,
            noise,
            episodes: Vec::new(),
        })
    }

    /// Store one episode.
    pub fn encode(&mut self, item: Item) {
        self.episodes.push(item);
    }

    /// Forget all stored episodes.
    pub fn reset(&mut self) {
        self.episodes.clear();
    }

    /// Decide on an offer. The stop probability grows with each retrieved
    /// item, and retrieval halts once another recall step would cross the
    /// decision deadline.
    pub fn decide<R: Rng>(&self, offer: &str, rng: &mut R) -> EpisodicDecision {
        let mut order: Vec<usize> = (0..self.episodes.len()).collect();
        order.shuffle(rng);

        let mut elapsed = self.non_decision_time;
        let mut recalled_value = 0.0;
        let mut n_recalled = 0u32;
        for idx in order {
            if rng.gen::<f64>() < self.p_stop * (n_recalled as f64 + 1.0) {
                break;
            }
            if elapsed + self.recall_time > self.max_decision_time {
                break;
            }
            let item = &self.episodes[idx];
            elapsed += self.recall_time;
            n_recalled += 1;
            if item.matches(offer) {
                recalled_value += item.reward + self.noise.sample(rng);
            }
        }
        EpisodicDecision {
            accepted: recalled_value > 0.0,
            rt: elapsed,
            n_recalled,
            recalled_value,
        }
    }
}

/// Decides from running per-feature reward sums through a logistic choice
/// rule; never consults individual episodes and always answers at the same
/// latency.
pub struct FeatureAgent {
    beta: f64,
    feature_values: HashMap<String, f64>,
}

impl FeatureAgent {
    /// Create an agent with inverse temperature `beta` (higher is more
    /// deterministic).
    pub fn new(beta: f64) -> Result<Self> {
        if !beta.is_finite() || beta <= 0.0 {
            return Err(Error::Validation(format!(
                "beta must be finite and positive, got {}",
                beta
            )));
        }
        Ok(Self { beta, feature_values: HashMap::new() })
    }

    /// Fold one item's reward into both of its feature sums.
    pub fn encode(&mut self, item: &Item) {
        *self.feature_values.entry(item.category.clone()).or_insert(0.0) += item.reward;
        *self.feature_values.entry(item.color.clone()).or_insert(0.0) += item.reward;
    }

    /// Forget all feature sums.
    pub fn reset(&mut self) {
        self.feature_values.clear();
    }

    /// Accept with probability `sigmoid(beta * value)`; an offer whose
    /// feature was never encoded is rejected outright.
    pub fn decide<R: Rng>(&self, offer: &str, rng: &mut R) -> bool {
        match self.feature_values.get(offer) {
            Some(value) => {
                let p_accept = 1.0 / (1.0 + (-self.beta * value).exp());
                rng.gen::<f64>() < p_accept
            }
            None => false,
        }
    }
}

/// Parameters for a full simulation run. The defaults pit slow noisy
/// recall against a sharp feature rule.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of simulated subjects.
    pub subjects: usize,
    /// Trials per subject; each trial contributes one row per offer.
    pub trials_per_subject: usize,
    /// RNG seed for the whole run.
    pub seed: u64,
    /// Episodic agent: fixed cost before the first recall.
    pub non_decision_time: f64,
    /// Episodic agent: time per retrieved item.
    pub recall_time: f64,
    /// Episodic agent: sd of the reward noise added at retrieval.
    pub recall_noise: f64,
    /// Episodic agent: base stop probability, scaled by items retrieved.
    pub p_stop: f64,
    /// Episodic agent: decision deadline.
    pub max_decision_time: f64,
    /// Feature agent: inverse temperature of the choice rule.
    pub beta: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            subjects: 30,
            trials_per_subject: 25,
            seed: 0,
            non_decision_time: 1.5,
            recall_time: 0.5,
            recall_noise: 0.5,
            p_stop: 0.1,
            max_decision_time: 7.5,
            beta: 5.0,
        }
    }
}

struct TrialRows {
    wid: Vec<String>,
    feature: Vec<Option<String>>,
    choice: Vec<f64>,
    rt: Vec<f64>,
    true_value: Vec<f64>,
    game_number: Vec<f64>,
}

impl TrialRows {
    fn new() -> Self {
        Self {
            wid: Vec::new(),
            feature: Vec::new(),
            choice: Vec::new(),
            rt: Vec::new(),
            true_value: Vec::new(),
            game_number: Vec::new(),
        }
    }

    fn push(&mut self, wid: &str, offer: &str, choice: bool, rt: f64, tv: f64, game: usize) {
        self.wid.push(wid.to_string());
        self.feature.push(Some(offer.to_string()));
        self.choice.push(if choice { 1.0 } else { 0.0 });
        self.rt.push(rt);
        self.true_value.push(tv);
        self.game_number.push(game as f64);
    }

    fn into_dataset(self, model: &str) -> Result<Dataset> {
        let n = self.wid.len();
        let mut data = Dataset::new(self.wid)?;
        data.add_column("model", Column::Categorical(vec![Some(model.to_string()); n]))?;
        data.add_column("feature", Column::Categorical(self.feature))?;
        data.add_column("choice", Column::Numeric(self.choice))?;
        data.add_column("rt", Column::Numeric(self.rt))?;
        data.add_column("true_value", Column::Numeric(self.true_value))?;
        data.add_column("game_number", Column::Numeric(self.game_number))?;
        Ok(data)
    }
}

/// Run the full simulation and return the episodic and feature-agent
/// trial tables, in that order. Deterministic given the seed.
pub fn simulate_tables(config: &SimulationConfig) -> Result<(Dataset, Dataset)> {
    if config.subjects == 0 {
        return Err(Error::Validation("subjects must be positive".to_string()));
    }
    if config.trials_per_subject == 0 {
        return Err(Error::Validation("trials_per_subject must be positive".to_string()));
    }
    let mut episodic = EpisodicAgent::new(
        config.non_decision_time,
        config.recall_time,
        config.recall_noise,
        config.p_stop,
        config.max_decision_time,
    )?;
    let mut feature_based = FeatureAgent::new(config.beta)?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut episodic_rows = TrialRows::new();
    let mut n_memories: Vec<f64> = Vec::new();
    let mut recalled_value: Vec<f64> = Vec::new();
    let mut feature_rows = TrialRows::new();

    for s in 0..config.subjects {
        let wid = format!("sim{:03}", s + 1);
        for _ in 0..config.trials_per_subject {
            // Half the games in a block cue on category, half on color.
            let mut cues = [Cue::Category, Cue::Color, Cue::Category, Cue::Color]
                .repeat(GAMES_PER_BLOCK / 4);
            cues.shuffle(&mut rng);
            let game_number = rng.gen_range(1..=GAMES_PER_BLOCK);
            let game = generate_game(cues[game_number - 1], &mut rng);

            episodic.reset();
            feature_based.reset();
            for item in &game.items {
                episodic.encode(item.clone());
                feature_based.encode(item);
            }

            for offer in &game.offers {
                let tv = game.true_value(offer);

                let d = episodic.decide(offer, &mut rng);
                episodic_rows.push(&wid, offer, d.accepted, d.rt, tv, game_number);
                n_memories.push(f64::from(d.n_recalled));
                recalled_value.push(d.recalled_value);

                let accepted = feature_based.decide(offer, &mut rng);
                feature_rows.push(&wid, offer, accepted, FEATURE_RT, tv, game_number);
            }
        }
    }

    let mut episodic_table = episodic_rows.into_dataset("episodic")?;
    episodic_table.add_column("n_memories", Column::Numeric(n_memories))?;
    episodic_table.add_column("recalled_value", Column::Numeric(recalled_value))?;
    let feature_table = feature_rows.into_dataset("feature")?;

    log::info!(
        "simulated {} subjects x {} trials ({} rows per table)",
        config.subjects,
        config.trials_per_subject,
        episodic_table.n_rows()
    );
    Ok((episodic_table, feature_table))
}
