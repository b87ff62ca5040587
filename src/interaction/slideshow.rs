//! Slideshow cursor and its autoplay actor.
//!
//! ```text
//!   SlideshowHandle ── mpsc<SlideCommand> ──▶ actor task ── watch<SlideState> ──▶ subscribers
//!                                               │
//!                                     deadline (reset on every
//!                                     manual change, cleared on hover)
//! ```

use crate::html::markup::Tags;
use std::time::Duration;
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};

/// Delay between two automatic advances.
pub const AUTOPLAY_INTERVAL: Duration = Duration::from_secs(5);

const COMMAND_BUFFER: usize = 16;

/// Position within a non-empty set of slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slideshow {
    current: usize,
    captions: Vec<Option<String>>,
    /// Last caption shown; slides without one keep the previous text.
    caption: Option<String>,
}

impl Slideshow {
    /// `None` when there are no slides. Missing captions are padded with `None`,
    /// extra ones are dropped.
    pub fn new(len: usize, mut captions: Vec<Option<String>>) -> Option<Self> {
        if len == 0 {
            return None;
        }
        captions.resize(len, None);
        let caption = captions[0].clone();
        Some(Self {
            current: 0,
            captions,
            caption,
        })
    }

    /// One slide per `.slides` element, captioned by its `data-caption`.
    pub fn from_markup(html: &str) -> Option<Self> {
        let captions: Vec<_> = Tags::new(html)
            .filter(|tag| tag.opens() && tag.has_class("slides"))
            .map(|tag| tag.attr("data-caption").filter(|c| !c.trim().is_empty()))
            .collect();
        Self::new(captions.len(), captions)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    #[inline]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Show slide `index`. Past the end wraps to the first slide, below zero
    /// to the last one.
    pub fn show(&mut self, index: isize) -> usize {
        let len = self.len() as isize;
        let index = if index >= len {
            0
        } else if index < 0 {
            len - 1
        } else {
            index
        };
        self.current = index as usize;
        if let Some(caption) = &self.captions[self.current] {
            self.caption = Some(caption.clone());
        }
        self.current
    }

    #[inline]
    pub fn next(&mut self) -> usize {
        self.show(self.current as isize + 1)
    }

    #[inline]
    pub fn prev(&mut self) -> usize {
        self.show(self.current as isize - 1)
    }

    /// Indicator button `index` clicked.
    pub fn go_to(&mut self, index: usize) -> usize {
        self.show(isize::try_from(index).unwrap_or(isize::MAX))
    }

    /// Whether slide `index` (and its indicator) is the active one.
    #[inline]
    pub fn is_active(&self, index: usize) -> bool {
        self.current == index
    }

    /// `"k / n"`, 1-based.
    pub fn counter(&self) -> String {
        format!("{} / {}", self.current + 1, self.len())
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
}

// ============================================================================
// Autoplay actor
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideCommand {
    Next,
    Prev,
    Show(usize),
    HoverEnter,
    HoverLeave,
    Shutdown,
}

/// What subscribers render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideState {
    pub current: usize,
    pub counter: String,
    pub caption: Option<String>,
    pub paused: bool,
}

impl SlideState {
    fn of(slideshow: &Slideshow, paused: bool) -> Self {
        Self {
            current: slideshow.current(),
            counter: slideshow.counter(),
            caption: slideshow.caption().map(str::to_owned),
            paused,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("slideshow actor has stopped")]
pub struct ActorStopped;

/// Owner side of a running slideshow actor.
pub struct SlideshowHandle {
    commands: mpsc::Sender<SlideCommand>,
    state: watch::Receiver<SlideState>,
    task: JoinHandle<Slideshow>,
}

impl SlideshowHandle {
    pub async fn send(&self, command: SlideCommand) -> Result<(), ActorStopped> {
        self.commands.send(command).await.map_err(|_| ActorStopped)
    }

    /// New receiver; the current state counts as already seen.
    pub fn subscribe(&self) -> watch::Receiver<SlideState> {
        self.state.clone()
    }

    pub fn state(&self) -> SlideState {
        self.state.borrow().clone()
    }

    /// Stop the actor and take back the slideshow.
    pub async fn shutdown(self) -> Result<Slideshow, ActorStopped> {
        // the actor may already be gone; its final state is in the task result
        let _ = self.commands.send(SlideCommand::Shutdown).await;
        self.task.await.map_err(|_| ActorStopped)
    }
}

/// Run `slideshow` with autoplay on the current tokio runtime.
pub fn spawn(slideshow: Slideshow, interval: Duration) -> SlideshowHandle {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (state_tx, state) = watch::channel(SlideState::of(&slideshow, false));

    let actor = SlideshowActor {
        slideshow,
        interval,
        deadline: Some(Instant::now() + interval),
        paused: false,
        commands: receiver,
        state: state_tx,
    };
    let task = tokio::spawn(actor.run());

    SlideshowHandle {
        commands,
        state,
        task,
    }
}

struct SlideshowActor {
    slideshow: Slideshow,
    interval: Duration,
    /// Next automatic advance; `None` while paused.
    deadline: Option<Instant>,
    paused: bool,
    commands: mpsc::Receiver<SlideCommand>,
    state: watch::Sender<SlideState>,
}

impl SlideshowActor {
    async fn run(mut self) -> Slideshow {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(SlideCommand::Shutdown) => break,
                    Some(command) => self.handle(command),
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.slideshow.next();
                    self.rearm();
                }
            }
            self.publish();
        }
        self.slideshow
    }

    fn handle(&mut self, command: SlideCommand) {
        match command {
            SlideCommand::Next => {
                self.slideshow.next();
            }
            SlideCommand::Prev => {
                self.slideshow.prev();
            }
            SlideCommand::Show(index) => {
                self.slideshow.go_to(index);
            }
            SlideCommand::HoverEnter => {
                self.paused = true;
                self.deadline = None;
                return;
            }
            SlideCommand::HoverLeave => self.paused = false,
            SlideCommand::Shutdown => return,
        }
        self.rearm();
    }

    /// Clear the pending advance and schedule a fresh one.
    fn rearm(&mut self) {
        self.deadline = (!self.paused).then(|| Instant::now() + self.interval);
    }

    fn publish(&self) {
        let next = SlideState::of(&self.slideshow, self.paused);
        self.state.send_if_modified(|state| {
            let changed = *state != next;
            *state = next;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captions(items: &[Option<&str>]) -> Vec<Option<String>> {
        items.iter().map(|c| c.map(str::to_owned)).collect()
    }

    #[test]
    fn test_empty_slideshow() {
        assert!(Slideshow::new(0, Vec::new()).is_none());
        assert!(Slideshow::from_markup("<div class=\"slideshow\"></div>").is_none());
    }

    #[test]
    fn test_wrap_around() {
        let mut show = Slideshow::new(3, Vec::new()).unwrap();
        assert_eq!(show.prev(), 2);
        assert_eq!(show.next(), 0);
        assert_eq!(show.show(3), 0);
        assert_eq!(show.show(-1), 2);
        assert_eq!(show.show(1), 1);
    }

    #[test]
    fn test_out_of_range_jumps_to_first() {
        let mut show = Slideshow::new(4, Vec::new()).unwrap();
        show.go_to(2);
        assert_eq!(show.show(9), 0);
        assert_eq!(show.go_to(usize::MAX), 0);
    }

    #[test]
    fn test_exactly_one_active() {
        let mut show = Slideshow::new(5, Vec::new()).unwrap();
        for step in [1isize, -3, 7, 4, 0] {
            show.show(step);
            assert_eq!((0..5).filter(|&i| show.is_active(i)).count(), 1);
        }
    }

    #[test]
    fn test_counter() {
        let mut show = Slideshow::new(4, Vec::new()).unwrap();
        assert_eq!(show.counter(), "1 / 4");
        show.prev();
        assert_eq!(show.counter(), "4 / 4");
    }

    #[test]
    fn test_caption_kept_when_slide_has_none() {
        let mut show = Slideshow::new(3, captions(&[Some("Gate"), None, Some("Mess")])).unwrap();
        assert_eq!(show.caption(), Some("Gate"));
        show.next();
        assert_eq!(show.caption(), Some("Gate"));
        show.next();
        assert_eq!(show.caption(), Some("Mess"));
    }

    #[test]
    fn test_from_markup() {
        let html = r#"<div class="slideshow">
            <div class="slides active" data-caption="Main gate"><img src="a.jpg"></div>
            <div class="slides"><img src="b.jpg"></div>
            <div class="slideshow-bottom-bar"><span class="caption"></span></div>
        </div>"#;
        let mut show = Slideshow::from_markup(html).unwrap();
        assert_eq!(show.len(), 2);
        assert_eq!(show.caption(), Some("Main gate"));
        show.next();
        assert_eq!(show.counter(), "2 / 2");
    }

    /// Timer deadlines are rounded to the millisecond.
    fn assert_elapsed(since: Instant, expected: Duration) {
        let elapsed = since.elapsed();
        let diff = elapsed.abs_diff(expected);
        assert!(diff <= Duration::from_millis(2), "{elapsed:?} != {expected:?}");
    }

    fn three() -> Slideshow {
        Slideshow::new(3, Vec::new()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_advances() {
        let start = Instant::now();
        let handle = spawn(three(), AUTOPLAY_INTERVAL);
        let mut state = handle.subscribe();

        state.changed().await.unwrap();
        assert_eq!(state.borrow().current, 1);
        assert_elapsed(start, AUTOPLAY_INTERVAL);

        state.changed().await.unwrap();
        assert_eq!(state.borrow().current, 2);
        assert_elapsed(start, AUTOPLAY_INTERVAL * 2);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_change_resets_timer() {
        let handle = spawn(three(), AUTOPLAY_INTERVAL);
        let mut state = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.send(SlideCommand::Next).await.unwrap();
        state.changed().await.unwrap();
        assert_eq!(state.borrow().current, 1);

        let manual = Instant::now();
        state.changed().await.unwrap();
        assert_eq!(state.borrow().current, 2);
        assert_elapsed(manual, AUTOPLAY_INTERVAL);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_suspends_autoplay() {
        let handle = spawn(three(), AUTOPLAY_INTERVAL);
        let mut state = handle.subscribe();

        handle.send(SlideCommand::HoverEnter).await.unwrap();
        state.changed().await.unwrap();
        assert!(state.borrow().paused);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(handle.state().current, 0);

        // manual navigation still works while hovering
        handle.send(SlideCommand::Prev).await.unwrap();
        state.changed().await.unwrap();
        assert_eq!(state.borrow().current, 2);

        handle.send(SlideCommand::HoverLeave).await.unwrap();
        state.changed().await.unwrap();
        assert!(!state.borrow().paused);

        let resumed = Instant::now();
        state.changed().await.unwrap();
        assert_eq!(state.borrow().current, 0);
        assert_elapsed(resumed, AUTOPLAY_INTERVAL);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_slideshow() {
        let handle = spawn(three(), AUTOPLAY_INTERVAL);
        handle.send(SlideCommand::Show(2)).await.unwrap();
        let show = handle.shutdown().await.unwrap();
        assert_eq!(show.current(), 2);
    }
}
