use neat_direct::genomics::{GeneticConfig, Genome, InnovationCache};
use neat_direct::networks::NetworkConfig;
use neat_direct::scoring::{evaluate, ScoringFunction};

use anyhow::{ensure, Context};
use clap::Parser;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Evolves networks computing XOR of two inputs, plus a bias input.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// RON file with genetic, network and run parameters.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the run's random source.
    #[arg(long)]
    seed: Option<u64>,
    /// Where the champion genome is written, as JSON.
    #[arg(long, default_value = "champion.json")]
    output: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    genetic: GeneticConfig,
    network: NetworkConfig,
    population_size: usize,
    generations: usize,
    /// Fraction of each generation allowed to reproduce.
    survival_threshold: f32,
    /// Number of champions copied unchanged into the next generation.
    elitism: usize,
    /// Mates are only drawn among genomes this close to each other.
    compatibility_threshold: f32,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            genetic: GeneticConfig {
                input_count: NonZeroUsize::new(3).unwrap(),
                output_count: NonZeroUsize::new(1).unwrap(),
                ..GeneticConfig::default()
            },
            network: NetworkConfig::default(),
            population_size: 150,
            generations: 300,
            survival_threshold: 0.2,
            elitism: 1,
            compatibility_threshold: 3.0,
        }
    }
}

const CASES: [([f32; 3], bool); 4] = [
    ([1.0, 0.0, 0.0], false),
    ([1.0, 0.0, 1.0], true),
    ([1.0, 1.0, 0.0], true),
    ([1.0, 1.0, 1.0], false),
];

const MAX_SCORE: f32 = 16.0;

/// Feeds the four XOR cases in a random order. The score is
/// `(4 - total error)^2`, and the task is solved once every
/// output lands on the right side of 0.5.
struct XorScore {
    order: [usize; 4],
    next: usize,
    error: f32,
    correct: usize,
}

impl XorScore {
    fn new<R: Rng>(rng: &mut R) -> XorScore {
        let mut order = [0, 1, 2, 3];
        order.shuffle(rng);
        XorScore {
            order,
            next: 0,
            error: 0.0,
            correct: 0,
        }
    }

    fn expected(&self) -> bool {
        CASES[self.order[self.next - 1]].1
    }
}

impl ScoringFunction for XorScore {
    fn next_input(&mut self) -> Option<Vec<f32>> {
        let case = self.order.get(self.next)?;
        self.next += 1;
        Some(CASES[*case].0.to_vec())
    }

    fn consume_output(&mut self, output: &[f32]) {
        let expected = self.expected();
        self.error += ((expected as u8 as f32) - output[0]).abs();
        if (output[0] >= 0.5) == expected {
            self.correct += 1;
        }
    }

    fn final_score(&self) -> f32 {
        (4.0 - self.error).powi(2)
    }

    fn is_solved(&self) -> bool {
        self.correct == CASES.len()
    }
}

fn load_config(args: &Args) -> anyhow::Result<RunConfig> {
    let config: RunConfig = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => RunConfig::default(),
    };
    ensure!(
        config.genetic.input_count.get() == 3 && config.genetic.output_count.get() == 1,
        "XOR genomes need 3 inputs (bias, a, b) and 1 output"
    );
    ensure!(
        config.population_size >= 2,
        "population_size must be at least 2"
    );
    Ok(config)
}

fn initial_population<R: Rng>(
    config: &RunConfig,
    cache: &InnovationCache,
    rng: &mut R,
) -> anyhow::Result<Vec<Genome>> {
    let randomize = GeneticConfig {
        weight_reset_chance: 1.0,
        ..config.genetic.clone()
    };
    (0..config.population_size)
        .map(|_| -> anyhow::Result<Genome> {
            let mut genome = Genome::new(&config.genetic);
            genome.initialize(cache)?;
            genome.mutate_weights(&randomize, rng);
            Ok(genome)
        })
        .collect()
}

/// Scores every genome in parallel, returning
/// whether each one solved the task.
fn evaluate_population(
    population: &mut [Genome],
    config: &NetworkConfig,
    seed: u64,
) -> anyhow::Result<Vec<bool>> {
    population
        .par_iter_mut()
        .enumerate()
        .map(|(i, genome)| -> anyhow::Result<bool> {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut scorer = XorScore::new(&mut rng);
            evaluate(genome, &mut scorer, config)?;
            Ok(scorer.is_solved())
        })
        .collect()
}

/// Builds the next generation: champions are kept as they
/// are, and the rest are offspring of the fittest genomes,
/// each mated with a compatible partner.
fn reproduce(
    ranked: &[Genome],
    cache: &InnovationCache,
    config: &RunConfig,
    seed: u64,
) -> Vec<Genome> {
    let survivors =
        ((ranked.len() as f32 * config.survival_threshold).ceil() as usize).clamp(1, ranked.len());
    let parents = &ranked[..survivors];
    let elites = config.elitism.min(config.population_size);

    let offspring: Vec<Genome> = (elites..config.population_size)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let first = &parents[rng.gen_range(0..parents.len())];
            let compatible: Vec<&Genome> = parents
                .iter()
                .filter(|g| {
                    first.compatibility_distance(g, &config.genetic) < config.compatibility_threshold
                })
                .collect();
            // A genome is always compatible with itself.
            let second = compatible.choose(&mut rng).copied().unwrap_or(first);
            Genome::mate(first, second, cache, &config.genetic, &mut rng)
        })
        .collect();

    ranked[..elites].iter().cloned().chain(offspring).collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let cache = InnovationCache::new(&config.genetic);
    let mut population = initial_population(&config, &cache, &mut rng)?;
    let mut best: Option<Genome> = None;

    for generation in 0..config.generations {
        let solved = evaluate_population(&mut population, &config.network, rng.gen())?;
        if let Some(winner) = solved.iter().position(|solved| *solved) {
            let winner = &population[winner];
            info!(generation, fitness = winner.fitness(), "found solution");
            debug!("{}", winner);
            return write_genome(&args.output, winner);
        }

        population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        let champion = &population[0];
        let mean = population.iter().map(Genome::fitness).sum::<f32>() / population.len() as f32;
        info!(
            generation,
            best = champion.fitness(),
            mean,
            genes = champion.gene_count(),
            "evaluated generation"
        );
        if best.as_ref().map_or(true, |b| champion.fitness() > b.fitness()) {
            best = Some(champion.clone());
        }

        cache.clear_mutations();
        population = reproduce(&population, &cache, &config, rng.gen());
    }

    let best = best.context("no generation was evaluated")?;
    warn!(
        generations = config.generations,
        best = best.fitness(),
        max = MAX_SCORE,
        "no solution found"
    );
    write_genome(&args.output, &best)
}

fn write_genome(path: &Path, genome: &Genome) -> anyhow::Result<()> {
    fs::write(path, serde_json::to_string_pretty(genome)?)
        .with_context(|| format!("writing {}", path.display()))
}
