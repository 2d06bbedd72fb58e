//! Query facade
//!
//! [`KnowledgeIndex`] is the object the application's composition root owns and
//! hands to word-bank generators, grammar-option pickers and review assembly.
//! It memoizes the Lexicon and the per-lesson snapshots, and can be reset or
//! reloaded for content hot-reload.
//!
//! Lexicon, lesson caches and the curriculum they came from live together in
//! one generation. Reset and reload replace the whole generation at once; a
//! query that already holds the old one finishes against it consistently.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::curriculum::{Curriculum, LessonId, LessonKey, ModuleId, Step};
use crate::error::IndexError;
use crate::index::{build, BuildOptions, Lexicon};
use crate::learned::{self, LearnedSnapshot, LearnedStateCache, LessonStates};
use crate::telemetry::{contexts, Telemetry, TracingTelemetry};

/// Clamp a signed step index into `[0, len - 1]`; `None` for an empty lesson
pub fn clamp_step_index(step_index: i64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = i64::try_from(len - 1).unwrap_or(i64::MAX);
    Some(step_index.clamp(0, last) as usize)
}

/// What the learner knows after `step_index` of `module/lesson`
///
/// Builds (or reuses) the lesson's snapshots in `cache`. Out-of-range indices
/// are clamped and reported; a lesson without steps yields an empty snapshot.
pub fn learned_state_for_step(
    cache: &LearnedStateCache,
    lexicon: &Lexicon,
    telemetry: &dyn Telemetry,
    module: &ModuleId,
    lesson: &LessonId,
    steps: &[Step],
    step_index: i64,
) -> Arc<LearnedSnapshot> {
    let Some(index) = clamp_step_index(step_index, steps.len()) else {
        return Arc::new(LearnedSnapshot::default());
    };
    if index as i64 != step_index {
        telemetry.warn(
            contexts::STEP_INDEX_CLAMPED,
            &format!(
                "{}/{} step {} clamped to {} ({} steps)",
                module,
                lesson,
                step_index,
                index,
                steps.len()
            ),
        );
    }

    let key = LessonKey::new(module.clone(), lesson.clone());
    let states = cache.get_or_build(&key, || {
        learned::build(module, lesson, steps, lexicon, telemetry)
    });
    states.at_clamped(index)
}

/// Lexicon, lesson caches and source content that belong together
struct Generation {
    number: u64,
    curriculum: Arc<Curriculum>,
    lexicon: OnceLock<Arc<Lexicon>>,
    build_lock: Mutex<()>,
    lessons: LearnedStateCache,
}

impl Generation {
    fn new(number: u64, curriculum: Arc<Curriculum>, memoize: bool) -> Self {
        Self {
            number,
            curriculum,
            lexicon: OnceLock::new(),
            build_lock: Mutex::new(()),
            lessons: LearnedStateCache::new(memoize),
        }
    }
}

/// The curriculum knowledge-state index
pub struct KnowledgeIndex {
    options: BuildOptions,
    memoize: bool,
    telemetry: Arc<dyn Telemetry>,
    current: RwLock<Arc<Generation>>,
    /// Held across every reset/reload so swaps never interleave
    swap_lock: Mutex<()>,
    generations: AtomicU64,
    lexicon_builds: AtomicUsize,
}

impl KnowledgeIndex {
    /// Create an index over `curriculum`; nothing is built until first use
    pub fn new(curriculum: Curriculum, config: &IndexConfig) -> Self {
        Self::with_telemetry(curriculum, config, Arc::new(TracingTelemetry))
    }

    pub fn with_telemetry(
        curriculum: Curriculum,
        config: &IndexConfig,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        let memoize = config.cache.memoize_lessons;
        Self {
            options: BuildOptions::from(config),
            memoize,
            telemetry,
            current: RwLock::new(Arc::new(Generation::new(0, Arc::new(curriculum), memoize))),
            swap_lock: Mutex::new(()),
            generations: AtomicU64::new(0),
            lexicon_builds: AtomicUsize::new(0),
        }
    }

    fn current(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn install(&self, generation: Generation) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(generation);
    }

    fn lock_swaps(&self) -> MutexGuard<'_, ()> {
        self.swap_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only called with the swap lock held
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Lexicon of `generation`, built at most once even under concurrent first access
    fn lexicon_of(&self, generation: &Generation) -> Result<Arc<Lexicon>, IndexError> {
        if let Some(lexicon) = generation.lexicon.get() {
            return Ok(Arc::clone(lexicon));
        }

        let _guard = generation
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(lexicon) = generation.lexicon.get() {
            return Ok(Arc::clone(lexicon));
        }

        let start = Instant::now();
        let lexicon = Arc::new(build(&generation.curriculum, &self.options, &*self.telemetry)?);
        self.lexicon_builds.fetch_add(1, Ordering::SeqCst);
        info!(
            "Built lexicon (generation {}): {} vocabulary items across {} lessons in {}µs",
            generation.number,
            lexicon.vocabulary_len(),
            lexicon.stats().lessons,
            start.elapsed().as_micros()
        );

        let _ = generation.lexicon.set(Arc::clone(&lexicon));
        Ok(lexicon)
    }

    /// Build the Lexicon now instead of on first query
    pub fn init(&self) -> Result<Arc<Lexicon>, IndexError> {
        self.lexicon()
    }

    /// The Lexicon, built on first access
    ///
    /// Direct reads are meant for whole-module/whole-lesson aggregates; step
    /// level questions go through [`Self::learned_state_for_step`].
    pub fn lexicon(&self) -> Result<Arc<Lexicon>, IndexError> {
        self.lexicon_of(&self.current())
    }

    /// Drop the Lexicon and every lesson cache together
    pub fn reset(&self) {
        let _swap = self.lock_swaps();
        let curriculum = self.curriculum();
        let number = self.next_generation();
        self.install(Generation::new(number, curriculum, self.memoize));
        debug!("Index reset to generation {}", number);
    }

    /// Swap in new content; everything is rebuilt lazily
    pub fn reload(&self, curriculum: Curriculum) {
        let _swap = self.lock_swaps();
        let number = self.next_generation();
        self.install(Generation::new(number, Arc::new(curriculum), self.memoize));
        info!("Curriculum reloaded as generation {}", number);
    }

    /// Build the Lexicon for `curriculum` first and swap only if it succeeds
    ///
    /// Returns the installed generation number. On error the current
    /// generation keeps serving and no number is used up.
    pub fn try_reload(&self, curriculum: Curriculum) -> Result<(u64, Arc<Lexicon>), IndexError> {
        let _swap = self.lock_swaps();
        let number = self.generations.load(Ordering::SeqCst) + 1;
        let generation = Generation::new(number, Arc::new(curriculum), self.memoize);
        let lexicon = self.lexicon_of(&generation)?;
        self.generations.store(number, Ordering::SeqCst);
        self.install(generation);
        info!("Curriculum reloaded as generation {}", number);
        Ok((number, lexicon))
    }

    /// The content snapshot currently served
    pub fn curriculum(&self) -> Arc<Curriculum> {
        Arc::clone(&self.current().curriculum)
    }

    /// What the learner knows after `step_index` of the given steps
    pub fn learned_state_for_step(
        &self,
        module: &ModuleId,
        lesson: &LessonId,
        steps: &[Step],
        step_index: i64,
    ) -> Result<Arc<LearnedSnapshot>, IndexError> {
        let generation = self.current();
        let lexicon = self.lexicon_of(&generation)?;
        Ok(learned_state_for_step(
            &generation.lessons,
            &lexicon,
            &*self.telemetry,
            module,
            lesson,
            steps,
            step_index,
        ))
    }

    /// Same as [`Self::learned_state_for_step`], with steps taken from the loaded curriculum
    ///
    /// An unknown lesson is reported and answered with an empty snapshot.
    pub fn learned_state(
        &self,
        module: &ModuleId,
        lesson: &LessonId,
        step_index: i64,
    ) -> Result<Arc<LearnedSnapshot>, IndexError> {
        let generation = self.current();
        let lexicon = self.lexicon_of(&generation)?;
        let Some(found) = generation.curriculum.lesson(module, lesson) else {
            self.telemetry.warn(
                contexts::UNKNOWN_LESSON,
                &format!("{}/{} is not part of the curriculum", module, lesson),
            );
            return Ok(Arc::new(LearnedSnapshot::default()));
        };

        Ok(learned_state_for_step(
            &generation.lessons,
            &lexicon,
            &*self.telemetry,
            module,
            lesson,
            &found.steps,
            step_index,
        ))
    }

    /// All snapshots of a curriculum lesson, `None` if the lesson does not exist
    pub fn lesson_states(
        &self,
        module: &ModuleId,
        lesson: &LessonId,
    ) -> Result<Option<Arc<LessonStates>>, IndexError> {
        let generation = self.current();
        let lexicon = self.lexicon_of(&generation)?;
        let Some(found) = generation.curriculum.lesson(module, lesson) else {
            return Ok(None);
        };

        let key = LessonKey::new(module.clone(), lesson.clone());
        let states = generation.lessons.get_or_build(&key, || {
            learned::build(module, lesson, &found.steps, &lexicon, &*self.telemetry)
        });
        Ok(Some(states))
    }

    /// State on entering a lesson, before any of its steps
    pub fn base_state(
        &self,
        module: &ModuleId,
        lesson: &LessonId,
    ) -> Result<LearnedSnapshot, IndexError> {
        let lexicon = self.lexicon()?;
        let key = LessonKey::new(module.clone(), lesson.clone());
        Ok(learned::base_state(&key, &lexicon))
    }

    /// Vocabulary owned by `module/lesson` and everything before it, or by
    /// `module` and every earlier module when no lesson is given
    pub fn vocabulary_through(
        &self,
        module: &ModuleId,
        lesson: Option<&LessonId>,
    ) -> Result<Vec<String>, IndexError> {
        let lexicon = self.lexicon()?;
        Ok(match lesson {
            Some(lesson) => {
                lexicon.vocabulary_through(&LessonKey::new(module.clone(), lesson.clone()))
            }
            None => lexicon.vocabulary_through_module(module),
        })
    }

    /// Vocabulary owned by a single module
    pub fn module_vocabulary(&self, module: &ModuleId) -> Result<Vec<String>, IndexError> {
        Ok(self.lexicon()?.module_vocabulary(module).to_vec())
    }

    /// Lessons with memoized snapshots in the current generation
    pub fn cached_lessons(&self) -> usize {
        self.current().lessons.len()
    }

    pub fn generation(&self) -> u64 {
        self.current().number
    }

    /// Lexicon builds over the index's lifetime, across generations
    pub fn lexicon_builds(&self) -> usize {
        self.lexicon_builds.load(Ordering::SeqCst)
    }

    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }
}
