//! Performance benchmarking for curidx
//!
//! Runs against a synthetic curriculum so numbers are comparable between
//! machines. Targets:
//! - Lexicon build: <50ms
//! - Warm step query: <0.05ms
//! - Concurrent first access: exactly one lexicon build

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::IndexConfig;
use crate::curriculum::{
    Blank, ChoiceOption, Curriculum, Lesson, LessonId, Module, ModuleId, Step, VocabularyItem,
};
use crate::error::IndexError;
use crate::facade::KnowledgeIndex;

const SUFFIX_POOL: &[&str] = &["lar", "ler", "im", "sin", "de", "da", "den", "dan", "mak", "mek"];
const CONNECTOR_POOL: &[&str] = &["ve", "ama", "çünkü", "veya"];

/// Shape of the synthetic curriculum and of the run
#[derive(Debug, Clone, Serialize)]
pub struct BenchParams {
    pub modules: usize,
    pub lessons: usize,
    pub steps: usize,
    pub iterations: usize,
    pub workers: usize,
    pub seed: u64,
}

impl Default for BenchParams {
    fn default() -> Self {
        Self {
            modules: 10,
            lessons: 8,
            steps: 40,
            iterations: 10,
            workers: 8,
            seed: 42,
        }
    }
}

fn option(id: String) -> ChoiceOption {
    ChoiceOption {
        id,
        text: String::new(),
    }
}

/// Generate a curriculum of `modules × lessons × steps`
pub fn synthetic_curriculum(params: &BenchParams) -> Result<Curriculum, IndexError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut modules = Vec::with_capacity(params.modules);

    for m in 1..=params.modules {
        let mut lessons = Vec::with_capacity(params.lessons);
        for l in 1..=params.lessons {
            let vocabulary: Vec<VocabularyItem> = (0..(params.steps / 3).max(1))
                .map(|v| VocabularyItem::new(format!("word-m{}-l{}-{}", m, l, v)))
                .collect();

            let mut steps = Vec::with_capacity(params.steps);
            let mut pending = vocabulary.iter();
            while steps.len() < params.steps {
                let roll = rng.gen_range(0..10);
                let step = match roll {
                    0..=3 => match pending.next() {
                        Some(item) => Step::flashcard(item.id.clone()),
                        None => Step::Quiz {
                            prompt: String::new(),
                            options: vec![],
                            answer: None,
                        },
                    },
                    4 => Step::GrammarIntro {
                        title: String::new(),
                        forms: vec![],
                    },
                    5 | 6 => {
                        let suffix = SUFFIX_POOL[rng.gen_range(0..SUFFIX_POOL.len())];
                        let mut options = vec![option(format!("suffix-{}", suffix))];
                        if rng.gen_bool(0.3) {
                            let conn = CONNECTOR_POOL[rng.gen_range(0..CONNECTOR_POOL.len())];
                            options.push(option(format!("conn-{}", conn)));
                        }
                        Step::GrammarFillBlank {
                            sentence: String::new(),
                            blanks: vec![Blank {
                                options,
                                answer: None,
                            }],
                        }
                    }
                    7 => Step::Matching { pairs: vec![] },
                    8 => Step::AudioSequence { tokens: vec![] },
                    _ => Step::Input {
                        prompt: String::new(),
                        answers: vec![],
                    },
                };
                steps.push(step);
            }

            lessons.push(Lesson {
                id: LessonId::parse(&format!("lesson{}", l))?,
                title: String::new(),
                steps,
                vocabulary,
                review: vec![],
            });
        }
        modules.push(Module {
            id: ModuleId::parse(&format!("module{}", m))?,
            title: String::new(),
            lessons,
        });
    }

    Ok(Curriculum { modules })
}

/// Benchmark results
#[derive(Debug, Serialize)]
pub struct BenchmarkResults {
    pub generated_at: DateTime<Utc>,
    pub params: BenchParams,
    pub total_steps: usize,
    pub build_avg_ms: f64,
    pub build_max_ms: f64,
    pub cold_lesson_avg_ms: f64,
    pub warm_query_avg_ms: f64,
    pub warm_query_max_ms: f64,
    pub concurrent_lexicon_builds: usize,
}

impl BenchmarkResults {
    /// Check if all critical benchmarks pass
    pub fn all_pass(&self) -> bool {
        self.build_avg_ms < 50.0
            && self.warm_query_avg_ms < 0.05
            && self.concurrent_lexicon_builds == 1
    }

    /// Format results as a markdown table
    pub fn to_markdown(&self) -> String {
        format!(
            r#"| Metric | Value | Target |
|--------|-------|--------|
| Lexicon build (avg) | {:.2}ms | <50ms |
| Lexicon build (max) | {:.2}ms | - |
| Cold lesson build (avg) | {:.3}ms | - |
| Warm query (avg) | {:.4}ms | <0.05ms |
| Warm query (max) | {:.4}ms | - |
| Concurrent lexicon builds | {} | 1 |
| Steps | {} | - |"#,
            self.build_avg_ms,
            self.build_max_ms,
            self.cold_lesson_avg_ms,
            self.warm_query_avg_ms,
            self.warm_query_max_ms,
            self.concurrent_lexicon_builds,
            self.total_steps
        )
    }
}

fn avg_ms(times: &[u128]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    times.iter().sum::<u128>() as f64 / times.len() as f64 / 1000.0
}

fn max_ms(times: &[u128]) -> f64 {
    *times.iter().max().unwrap_or(&0) as f64 / 1000.0
}

/// Run performance benchmarks
pub async fn run_benchmarks(params: BenchParams) -> Result<BenchmarkResults> {
    println!("curidx Performance Benchmarks");
    println!("=============================");
    println!();

    let curriculum = synthetic_curriculum(&params)?;
    let total_steps = curriculum.step_count();
    println!(
        "Synthetic curriculum: {} modules × {} lessons × {} steps ({} steps total)",
        params.modules, params.lessons, params.steps, total_steps
    );
    println!();

    let index = Arc::new(KnowledgeIndex::new(curriculum, &IndexConfig::default()));
    let iterations = params.iterations.max(1);

    // Benchmark 1: Lexicon build
    println!("1. Lexicon Build");
    println!("   Target: <50ms");
    let mut build_times = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        index.reset();
        let start = Instant::now();
        index.init()?;
        build_times.push(start.elapsed().as_micros());
    }
    let build_avg_ms = avg_ms(&build_times);
    let build_max_ms = max_ms(&build_times);
    println!("   Avg: {:.2}ms  Max: {:.2}ms", build_avg_ms, build_max_ms);
    if build_avg_ms < 50.0 {
        println!("   ✅ PASS");
    } else {
        println!("   ❌ FAIL (exceeds 50ms target)");
    }
    println!();

    // Benchmark 2: Cold lesson build (first query per lesson)
    println!("2. Cold Lesson Build");
    let content = index.curriculum();
    let mut cold_times = Vec::new();
    for (key, _) in content.lessons() {
        let start = Instant::now();
        index.learned_state(&key.module, &key.lesson, 0)?;
        cold_times.push(start.elapsed().as_micros());
    }
    let cold_lesson_avg_ms = avg_ms(&cold_times);
    println!("   Avg: {:.3}ms over {} lessons", cold_lesson_avg_ms, cold_times.len());
    println!();

    // Benchmark 3: Warm query
    println!("3. Warm Step Query");
    println!("   Target: <0.05ms");
    let mut warm_times = Vec::new();
    for _ in 0..iterations {
        for (key, lesson) in content.lessons() {
            let last = lesson.steps.len() as i64 - 1;
            let start = Instant::now();
            index.learned_state(&key.module, &key.lesson, last)?;
            warm_times.push(start.elapsed().as_micros());
        }
    }
    let warm_query_avg_ms = avg_ms(&warm_times);
    let warm_query_max_ms = max_ms(&warm_times);
    println!("   Avg: {:.4}ms  Max: {:.4}ms", warm_query_avg_ms, warm_query_max_ms);
    if warm_query_avg_ms < 0.05 {
        println!("   ✅ PASS");
    } else {
        println!("   ⚠️  ABOVE TARGET (0.05ms)");
    }
    println!();

    // Benchmark 4: Concurrent first access
    println!("4. Concurrent First Access");
    println!("   Target: 1 lexicon build for {} workers", params.workers);
    index.reset();
    let builds_before = index.lexicon_builds();
    let (module, lesson) = content
        .lessons()
        .last()
        .map(|(key, _)| (key.module, key.lesson))
        .ok_or_else(|| anyhow::anyhow!("Synthetic curriculum has no lessons"))?;

    let mut handles = Vec::with_capacity(params.workers);
    for _ in 0..params.workers.max(1) {
        let index = Arc::clone(&index);
        let module = module.clone();
        let lesson = lesson.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            index.learned_state(&module, &lesson, i64::MAX)
        }));
    }
    for handle in handles {
        handle.await??;
    }
    let concurrent_lexicon_builds = index.lexicon_builds() - builds_before;
    println!("   Lexicon builds: {}", concurrent_lexicon_builds);
    if concurrent_lexicon_builds == 1 {
        println!("   ✅ PASS");
    } else {
        println!("   ❌ FAIL (build was not single-flight)");
    }
    println!();

    let results = BenchmarkResults {
        generated_at: Utc::now(),
        params,
        total_steps,
        build_avg_ms,
        build_max_ms,
        cold_lesson_avg_ms,
        warm_query_avg_ms,
        warm_query_max_ms,
        concurrent_lexicon_builds,
    };

    println!("Summary");
    println!("-------");
    if results.all_pass() {
        println!("✅ All critical benchmarks PASSED");
    } else {
        println!("❌ Some benchmarks FAILED - optimization needed");
    }
    println!();

    Ok(results)
}
