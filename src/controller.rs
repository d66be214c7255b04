use chrono::{DateTime, Local};
use std::collections::HashSet;

use crate::clock::Clock;
use crate::feedback::{Chime, ResultListener, Silent};
use crate::history::HistoryStore;
use crate::session::{self, Phase, QuestionResult, Session};
use crate::settings::Settings;
use crate::stats::{self, LiveStats, SessionStats};
use crate::util::default_exam_name;

/// Owns one timed test from start to end.
///
/// Every operation is total: calling one in the wrong phase does nothing,
/// so key handlers can call freely.
pub struct SessionController<C: Clock, H: HistoryStore> {
    clock: C,
    history: H,
    listener: Box<dyn ResultListener>,
    chime: Box<dyn Chime>,
    /// Applies to the next session that starts
    settings: Settings,
    /// Frozen copy used by the session in progress
    session_settings: Settings,
    preset_name: Option<String>,
    phase: Phase,
    current_question: u32,
    elapsed: u32,
    results: Vec<QuestionResult>,
    marked: HashSet<u32>,
    exam_name: String,
    started_at: DateTime<Local>,
    last_persist_failed: bool,
}

impl<C: Clock, H: HistoryStore> SessionController<C, H> {
    pub fn new(settings: Settings, clock: C, history: H) -> Self {
        let now = Local::now();
        Self {
            clock,
            history,
            listener: Box::new(Silent),
            chime: Box::new(Silent),
            settings,
            session_settings: settings,
            preset_name: None,
            phase: Phase::Idle,
            current_question: 1,
            elapsed: 0,
            results: Vec::new(),
            marked: HashSet::new(),
            exam_name: default_exam_name(now),
            started_at: now,
            last_persist_failed: false,
        }
    }

    pub fn with_listener(mut self, listener: impl ResultListener + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_chime(mut self, chime: impl Chime + 'static) -> Self {
        self.chime = Box::new(chime);
        self
    }

    /// Name every new session gets instead of the dated default
    pub fn with_exam_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.exam_name = name.clone();
        self.preset_name = Some(name);
        self
    }

    // -- transitions --

    pub fn start(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Ended) {
            return;
        }
        self.clear();
        self.session_settings = self.settings;
        self.started_at = Local::now();
        self.phase = Phase::Running;
        self.clock.start();
        tracing::debug!(
            exam = %self.exam_name,
            target = self.session_settings.target_seconds,
            margin = self.session_settings.warning_margin,
            "session started"
        );
    }

    pub fn pause(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        self.on_tick();
        self.clock.stop();
        self.phase = Phase::Paused;
        tracing::debug!(question = self.current_question, elapsed = self.elapsed, "paused");
    }

    pub fn resume(&mut self) {
        if self.phase != Phase::Paused {
            return;
        }
        self.phase = Phase::Running;
        self.clock.start();
        tracing::debug!(question = self.current_question, elapsed = self.elapsed, "resumed");
    }

    /// Start, pause or resume depending on where the session is
    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Idle | Phase::Ended => self.start(),
            Phase::Paused => self.resume(),
            Phase::Running => self.pause(),
        }
    }

    /// Record the current question with its elapsed time and move on
    pub fn advance(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        self.on_tick();
        self.move_on(self.elapsed);
    }

    /// Record the current question as skipped (zero seconds) and move on
    pub fn skip(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        self.on_tick();
        self.move_on(0);
    }

    pub fn mark(&mut self) {
        if self.phase == Phase::Running {
            self.marked.insert(self.current_question);
        }
    }

    pub fn unmark(&mut self) {
        if self.phase == Phase::Running {
            self.marked.remove(&self.current_question);
        }
    }

    pub fn toggle_mark(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        if !self.marked.remove(&self.current_question) {
            self.marked.insert(self.current_question);
        }
    }

    /// Restart the count for the current question without recording anything
    pub fn reset_elapsed(&mut self) {
        self.elapsed = 0;
    }

    /// Finish the session. Ending an already ended session stores it again,
    /// the same way the first end did.
    pub fn end(&mut self) {
        let was_live = match self.phase {
            Phase::Running | Phase::Paused => true,
            Phase::Ended if !self.results.is_empty() => false,
            _ => return,
        };

        if self.phase == Phase::Running {
            self.on_tick();
        }
        self.clock.stop();
        if was_live && self.elapsed > 0 {
            self.record(self.elapsed);
        }
        self.elapsed = 0;
        self.phase = Phase::Ended;

        if !self.results.is_empty() {
            self.persist();
        }
        tracing::debug!(results = self.results.len(), "session ended");
    }

    /// Throw away the in-memory session; stored history is untouched
    pub fn reset(&mut self) {
        self.clock.stop();
        self.clear();
        self.phase = Phase::Idle;
        tracing::debug!("session reset");
    }

    // -- clock --

    /// Pull whatever whole seconds the clock has accumulated
    pub fn on_tick(&mut self) {
        let due = self.clock.due_seconds();
        if self.phase == Phase::Running {
            self.elapsed = self.elapsed.saturating_add(due);
        }
    }

    /// Apply exactly one second. Only for drivers that count seconds
    /// themselves (tests, scripted runs); mixing it with `on_tick` on a
    /// running `MonotonicClock` counts the same second twice.
    pub fn tick(&mut self) {
        if self.phase == Phase::Running {
            self.elapsed = self.elapsed.saturating_add(1);
        }
    }

    // -- edits --

    /// Rename the session. Once it has been stored, the stored copy is
    /// renamed too if it still looks like this session.
    pub fn set_exam_name(&mut self, name: impl Into<String>) {
        self.exam_name = name.into();
        if self.phase != Phase::Ended || self.results.is_empty() {
            return;
        }
        match self
            .history
            .rename_latest_if_matches(self.results.len(), &self.exam_name)
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!("latest stored session does not match; rename kept in memory"),
            Err(e) => self.persist_failed("rename", e),
        }
    }

    /// Replace the note on the recorded result for `number`.
    /// Returns false if no such result exists.
    pub fn set_note(&mut self, number: u32, note: impl Into<String>) -> bool {
        let Some(result) = self.results.iter_mut().find(|r| r.number == number) else {
            return false;
        };
        result.note = note.into();
        if self.phase == Phase::Ended {
            let note = result.note.clone();
            if let Err(e) =
                self.history
                    .annotate_latest_if_matches(self.results.len(), number, &note)
            {
                self.persist_failed("note", e);
            }
        }
        true
    }

    /// Takes effect from the next `start`; recorded results are never reclassified
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if self.phase == Phase::Idle {
            self.session_settings = settings;
        }
    }

    // -- read accessors --

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question(&self) -> u32 {
        self.current_question
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    pub fn is_marked(&self) -> bool {
        self.marked.contains(&self.current_question)
    }

    pub fn exam_name(&self) -> &str {
        &self.exam_name
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Target and margin of the session in progress (or about to start)
    pub fn session_settings(&self) -> Settings {
        self.session_settings
    }

    pub fn in_warning_zone(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Paused)
            && session::in_warning_zone(
                self.elapsed,
                self.session_settings.target_seconds,
                self.session_settings.warning_margin,
            )
    }

    pub fn last_persist_failed(&self) -> bool {
        self.last_persist_failed
    }

    pub fn session(&self) -> Session {
        Session {
            exam_name: self.exam_name.clone(),
            started_at: self.started_at,
            results: self.results.clone(),
            target_seconds: self.session_settings.target_seconds,
            warning_margin: self.session_settings.warning_margin,
        }
    }

    pub fn stats(&self) -> SessionStats {
        stats::summarize(&self.results, self.session_settings.target_seconds)
    }

    pub fn live_stats(&self) -> LiveStats {
        let summary = self.stats();
        LiveStats {
            current_question: self.current_question,
            questions_done: summary.total_questions,
            total_seconds: summary.total_seconds,
            average_seconds: summary.average_seconds,
            marked: self.results.iter().filter(|r| r.marked).count()
                + usize::from(self.is_marked()),
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // -- internals --

    fn move_on(&mut self, recorded_elapsed: u32) {
        self.clock.stop();
        self.record(recorded_elapsed);
        self.marked.remove(&self.current_question);
        self.current_question += 1;
        self.elapsed = 0;
        self.clock.start();
    }

    fn record(&mut self, elapsed: u32) {
        let result = QuestionResult {
            number: self.current_question,
            elapsed_seconds: elapsed,
            status: self.session_settings.classify(elapsed),
            marked: self.marked.contains(&self.current_question),
            note: String::new(),
        };
        tracing::debug!(
            question = result.number,
            elapsed = result.elapsed_seconds,
            status = %result.status,
            marked = result.marked,
            "result recorded"
        );
        self.listener.result_recorded(&result);
        if let Err(e) = self.chime.chime() {
            tracing::debug!("chime failed: {e}");
        }
        self.results.push(result);
    }

    fn persist(&mut self) {
        let session = self.session();
        match self.history.append(&session) {
            Ok(()) => {
                self.last_persist_failed = false;
                tracing::info!(
                    exam = %session.exam_name,
                    questions = session.results.len(),
                    "session saved to history"
                );
            }
            Err(e) => self.persist_failed("append", e),
        }
    }

    fn persist_failed(&mut self, op: &str, e: crate::history::HistoryError) {
        self.last_persist_failed = true;
        tracing::warn!(op, "history write failed: {e}");
    }

    fn clear(&mut self) {
        self.current_question = 1;
        self.elapsed = 0;
        self.results.clear();
        self.marked.clear();
        self.exam_name = match &self.preset_name {
            Some(name) => name.clone(),
            None => default_exam_name(Local::now()),
        };
        self.last_persist_failed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feedback::ChannelListener;
    use crate::history::MemoryHistory;
    use crate::session::Status;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;
    use std::sync::mpsc;

    type Controller = SessionController<ManualClock, MemoryHistory>;

    fn controller() -> Controller {
        SessionController::new(Settings::default(), ManualClock::new(), MemoryHistory::new())
    }

    fn running() -> Controller {
        let mut c = controller();
        c.start();
        c
    }

    /// Let `secs` pass on the clock and deliver them
    fn wait(c: &mut Controller, secs: u32) {
        c.clock_mut().advance(secs);
        c.on_tick();
    }

    struct CountingChime(Rc<Cell<usize>>);

    impl Chime for CountingChime {
        fn chime(&mut self) -> io::Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    struct BrokenChime;

    impl Chime for BrokenChime {
        fn chime(&mut self) -> io::Result<()> {
            Err(io::Error::other("no audio device"))
        }
    }

    #[test]
    fn test_initial_state() {
        let c = controller();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.current_question(), 1);
        assert_eq!(c.elapsed(), 0);
        assert!(c.results().is_empty());
        assert!(!c.is_marked());
        assert!(c.exam_name().starts_with("Test "));
    }

    #[test]
    fn test_start_runs_clock() {
        let mut c = running();
        assert_eq!(c.phase(), Phase::Running);
        assert!(c.clock_mut().is_active());
        wait(&mut c, 3);
        assert_eq!(c.elapsed(), 3);
    }

    #[test]
    fn test_start_only_from_idle_or_ended() {
        let mut c = running();
        wait(&mut c, 4);
        c.start();
        assert_eq!(c.elapsed(), 4);

        c.pause();
        c.start();
        assert_eq!(c.phase(), Phase::Paused);
        assert_eq!(c.elapsed(), 4);
    }

    #[test]
    fn test_out_of_phase_calls_are_noops() {
        let mut c = controller();
        c.advance();
        c.skip();
        c.pause();
        c.resume();
        c.mark();
        c.toggle_mark();
        c.end();
        c.tick();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.results().is_empty());
        assert_eq!(c.current_question(), 1);
        assert!(c.history().sessions().is_empty());
    }

    #[test]
    fn test_consecutive_advances_number_results() {
        let mut c = running();
        for i in 0..5 {
            wait(&mut c, i + 1);
            c.advance();
        }
        assert_eq!(c.results().len(), 5);
        for (i, r) in c.results().iter().enumerate() {
            assert_eq!(r.number, i as u32 + 1);
            assert_eq!(r.elapsed_seconds, i as u32 + 1);
        }
        assert_eq!(c.current_question(), 6);
        assert_eq!(c.elapsed(), 0);
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_advance_classifies_elapsed() {
        let mut c = running();
        wait(&mut c, 5);
        c.advance();
        wait(&mut c, 20);
        c.advance();
        wait(&mut c, 31);
        c.advance();
        c.advance();
        let statuses: Vec<Status> = c.results().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Fast, Status::OnTime, Status::Slow, Status::Skipped]
        );
    }

    #[test]
    fn test_skip_records_zero() {
        let mut c = running();
        wait(&mut c, 40);
        c.skip();
        let r = &c.results()[0];
        assert_eq!(r.elapsed_seconds, 0);
        assert_eq!(r.status, Status::Skipped);
        assert_eq!(c.phase(), Phase::Running);
        assert!(c.clock_mut().is_active());
        assert_eq!(c.current_question(), 2);
    }

    #[test]
    fn test_skip_while_paused_is_ignored() {
        let mut c = running();
        wait(&mut c, 8);
        c.pause();
        c.skip();
        assert!(c.results().is_empty());
        assert_eq!(c.phase(), Phase::Paused);
    }

    #[test]
    fn test_mark_is_consumed_by_advance() {
        let mut c = running();
        c.mark();
        assert!(c.is_marked());
        wait(&mut c, 10);
        c.advance();
        assert!(c.results()[0].marked);
        assert!(!c.is_marked());

        wait(&mut c, 10);
        c.advance();
        assert!(!c.results()[1].marked);
    }

    #[test]
    fn test_toggle_mark_and_unmark() {
        let mut c = running();
        c.toggle_mark();
        assert!(c.is_marked());
        c.toggle_mark();
        assert!(!c.is_marked());
        c.mark();
        c.unmark();
        c.skip();
        assert!(!c.results()[0].marked);
    }

    #[test]
    fn test_skip_captures_mark() {
        let mut c = running();
        c.mark();
        c.skip();
        assert!(c.results()[0].marked);
        assert!(!c.is_marked());
        assert_eq!(c.live_stats().marked, 1);
    }

    #[test]
    fn test_pause_resume_preserves_elapsed() {
        let mut c = running();
        wait(&mut c, 7);
        c.pause();
        assert_eq!(c.phase(), Phase::Paused);
        assert!(!c.clock_mut().is_active());

        // time passing while paused is not counted
        wait(&mut c, 30);
        c.tick();
        assert_eq!(c.elapsed(), 7);

        c.resume();
        assert_eq!(c.phase(), Phase::Running);
        assert_eq!(c.elapsed(), 7);
        wait(&mut c, 2);
        assert_eq!(c.elapsed(), 9);
    }

    #[test]
    fn test_pause_applies_pending_seconds_first() {
        let mut c = running();
        c.clock_mut().advance(4);
        c.pause();
        assert_eq!(c.elapsed(), 4);
    }

    #[test]
    fn test_toggle_pause_cycles() {
        let mut c = controller();
        c.toggle_pause();
        assert_eq!(c.phase(), Phase::Running);
        c.toggle_pause();
        assert_eq!(c.phase(), Phase::Paused);
        c.toggle_pause();
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_tick_counts_one_second_while_running() {
        let mut c = running();
        c.tick();
        c.tick();
        assert_eq!(c.elapsed(), 2);
    }

    #[test]
    fn test_reset_elapsed_records_nothing() {
        let mut c = running();
        wait(&mut c, 12);
        c.reset_elapsed();
        assert_eq!(c.elapsed(), 0);
        assert!(c.results().is_empty());
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_end_records_final_question() {
        let mut c = running();
        wait(&mut c, 10);
        c.advance();
        c.mark();
        wait(&mut c, 30);
        c.end();

        assert_eq!(c.phase(), Phase::Ended);
        assert_eq!(c.results().len(), 2);
        let last = &c.results()[1];
        assert_eq!(last.number, 2);
        assert_eq!(last.elapsed_seconds, 30);
        assert_eq!(last.status, Status::Slow);
        assert!(last.marked);
        assert_eq!(c.current_question(), 2);
        assert!(!c.clock_mut().is_active());
        assert_eq!(c.history().sessions().len(), 1);
        assert_eq!(c.history().sessions()[0].results.len(), 2);
    }

    #[test]
    fn test_end_with_zero_elapsed_adds_nothing() {
        let mut c = running();
        wait(&mut c, 10);
        c.advance();
        c.end();
        assert_eq!(c.results().len(), 1);
    }

    #[test]
    fn test_end_without_results_is_not_stored() {
        let mut c = running();
        c.end();
        assert_eq!(c.phase(), Phase::Ended);
        assert!(c.history().sessions().is_empty());
    }

    #[test]
    fn test_end_from_pause_records_paused_time() {
        let mut c = running();
        wait(&mut c, 6);
        c.pause();
        c.end();
        assert_eq!(c.results()[0].elapsed_seconds, 6);
        assert_eq!(c.history().sessions().len(), 1);
    }

    #[test]
    fn test_ending_again_stores_session_again() {
        let mut c = running();
        wait(&mut c, 6);
        c.end();
        assert_eq!(c.history().sessions().len(), 1);

        c.end();
        assert_eq!(c.phase(), Phase::Ended);
        assert_eq!(c.results().len(), 1);
        assert_eq!(c.elapsed(), 0);
        let stored = c.history().sessions();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], stored[1]);
    }

    #[test]
    fn test_reset_returns_to_initial_state() {
        let mut c = running();
        wait(&mut c, 10);
        c.advance();
        c.mark();
        c.end();

        c.reset();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.current_question(), 1);
        assert!(c.results().is_empty());
        assert!(!c.is_marked());
        assert_eq!(c.history().sessions().len(), 1);

        c.start();
        assert_eq!(c.current_question(), 1);
        assert!(c.results().is_empty());
        assert_eq!(c.elapsed(), 0);
    }

    #[test]
    fn test_reset_regenerates_custom_exam_name() {
        let mut c = running();
        c.set_exam_name("custom");
        assert_eq!(c.exam_name(), "custom");

        c.reset();
        c.start();
        assert_eq!(c.exam_name(), default_exam_name(c.started_at()));
        assert!(c.exam_name().starts_with("Test "));
    }

    #[test]
    fn test_start_after_end_begins_fresh() {
        let mut c = running();
        wait(&mut c, 3);
        c.end();
        c.start();
        assert_eq!(c.phase(), Phase::Running);
        assert!(c.results().is_empty());
        assert_eq!(c.current_question(), 1);
    }

    #[test]
    fn test_notifications_once_per_result() {
        let (tx, rx) = mpsc::channel();
        let chimes = Rc::new(Cell::new(0));
        let mut c = controller()
            .with_listener(ChannelListener::new(tx))
            .with_chime(CountingChime(chimes.clone()));
        c.start();
        wait(&mut c, 5);
        c.advance();
        c.skip();
        wait(&mut c, 2);
        c.end();

        let seen: Vec<u32> = rx.try_iter().map(|r| r.number).collect();
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(chimes.get(), 3);
    }

    #[test]
    fn test_broken_chime_does_not_abort_transition() {
        let mut c = controller().with_chime(BrokenChime);
        c.start();
        wait(&mut c, 5);
        c.advance();
        assert_eq!(c.results().len(), 1);
        assert_eq!(c.current_question(), 2);
    }

    #[test]
    fn test_persist_failure_keeps_state_usable() {
        let mut c = SessionController::new(
            Settings::default(),
            ManualClock::new(),
            MemoryHistory::unavailable(),
        );
        c.start();
        wait(&mut c, 5);
        c.end();
        assert!(c.last_persist_failed());
        assert_eq!(c.phase(), Phase::Ended);
        assert_eq!(c.results().len(), 1);
        assert_eq!(c.stats().total_seconds, 5);

        c.start();
        assert!(!c.last_persist_failed());
        assert_eq!(c.phase(), Phase::Running);
    }

    #[test]
    fn test_rename_after_end_updates_history() {
        let mut c = running();
        wait(&mut c, 5);
        c.advance();
        c.end();
        c.set_exam_name("Biology mock");
        assert_eq!(c.exam_name(), "Biology mock");
        assert_eq!(c.history().sessions()[0].exam_name, "Biology mock");
    }

    #[test]
    fn test_rename_skips_mismatched_history() {
        let mut c = running();
        wait(&mut c, 5);
        c.end();
        c.history_mut()
            .append(&Session {
                exam_name: "someone else".into(),
                started_at: Local::now(),
                results: Vec::new(),
                target_seconds: 25,
                warning_margin: 10,
            })
            .unwrap();
        c.set_exam_name("mine");
        assert_ne!(c.history().sessions()[0].exam_name, "mine");
        assert_eq!(c.history().sessions()[1].exam_name, "someone else");
    }

    #[test]
    fn test_rename_while_running_stays_in_memory() {
        let mut c = running();
        c.set_exam_name("draft");
        wait(&mut c, 3);
        c.end();
        assert_eq!(c.history().sessions()[0].exam_name, "draft");
    }

    #[test]
    fn test_notes_editable_after_end() {
        let mut c = running();
        wait(&mut c, 5);
        c.advance();
        wait(&mut c, 9);
        c.end();
        assert!(c.set_note(2, "re-check the algebra"));
        assert!(!c.set_note(5, "nothing here"));
        assert_eq!(c.results()[1].note, "re-check the algebra");
        assert_eq!(
            c.history().sessions()[0].results[1].note,
            "re-check the algebra"
        );
    }

    #[test]
    fn test_settings_apply_to_next_session_only() {
        let mut c = running();
        c.apply_settings(Settings {
            target_seconds: 60,
            warning_margin: 5,
        });
        wait(&mut c, 30);
        c.advance();
        assert_eq!(c.results()[0].status, Status::Slow);
        c.end();
        assert_eq!(c.history().sessions()[0].target_seconds, 25);

        c.start();
        wait(&mut c, 30);
        c.advance();
        assert_eq!(c.results()[0].status, Status::Fast);
        assert_eq!(c.session().target_seconds, 60);
    }

    #[test]
    fn test_warning_zone_follows_elapsed() {
        let mut c = running();
        wait(&mut c, 14);
        assert!(!c.in_warning_zone());
        wait(&mut c, 1);
        assert!(c.in_warning_zone());
        wait(&mut c, 10);
        assert!(!c.in_warning_zone());
    }

    #[test]
    fn test_preset_exam_name_survives_reset() {
        let mut c = controller().with_exam_name("Mock A");
        c.start();
        c.reset();
        c.start();
        assert_eq!(c.exam_name(), "Mock A");
    }

    #[test]
    fn test_stats_and_live_stats() {
        let mut c = running();
        for secs in [10, 30, 20] {
            wait(&mut c, secs);
            c.advance();
        }
        c.mark();
        let stats = c.stats();
        assert_eq!(stats.total_seconds, 60);
        assert_eq!(stats.average_seconds, 20);
        assert_eq!(stats.fastest_seconds, 10);
        assert_eq!(stats.slowest_seconds, 30);
        assert_eq!(stats.within_target, 2);

        let live = c.live_stats();
        assert_eq!(live.current_question, 4);
        assert_eq!(live.questions_done, 3);
        assert_eq!(live.marked, 1);
    }
}
