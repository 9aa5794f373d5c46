//! Keyframe playback.
//!
//! Each node with keyframes can have one playback task. The host drives
//! every task by calling [`Animator::tick`] once per frame; there are no
//! timers or callbacks of our own.

use crate::scene::Scene;
use crate::shapes::NodeId;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// One animation step: where the node goes and how long it stays there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Hold time in milliseconds.
    pub duration: f64,
}

impl Keyframe {
    pub fn new(x: f64, y: f64, rotation: f64, duration: f64) -> Self {
        Self {
            x,
            y,
            rotation,
            duration,
        }
    }

    /// Negative and NaN durations hold for nothing; anything too long for a
    /// `Duration` holds forever.
    fn hold(&self) -> Duration {
        if self.duration.is_nan() || self.duration <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.duration / 1000.0).unwrap_or(Duration::MAX)
    }
}

/// Shared cancellation flag for one playback task.
///
/// Clones observe the same flag, so a host can hold a token and cancel the
/// task later without going through the [`Animator`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Playback state of a single node.
#[derive(Debug, Clone)]
pub struct Playback {
    /// Next frame to apply.
    pub frame_index: usize,
    pub paused: bool,
    /// Time left before the next frame is applied.
    remaining: Duration,
    token: CancelToken,
}

/// Per-node playback tasks.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    playing: HashMap<NodeId, Playback>,
    /// Last applied frame per node, kept after playback ends.
    current: HashMap<NodeId, usize>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playback, or resume it if the node is paused.
    ///
    /// Returns `false` when the node is missing or has no keyframes.
    pub fn play(&mut self, scene: &Scene, id: &NodeId) -> bool {
        if let Some(playback) = self.playing.get_mut(id) {
            if !playback.token.is_cancelled() {
                playback.paused = false;
                return true;
            }
        }
        self.start(scene, id)
    }

    /// Restart playback from the first keyframe.
    pub fn animate(&mut self, scene: &Scene, id: &NodeId) -> bool {
        self.playing.remove(id);
        self.start(scene, id)
    }

    fn start(&mut self, scene: &Scene, id: &NodeId) -> bool {
        match scene.find(id) {
            Some(node) if !node.frames.is_empty() => {
                self.playing.insert(
                    id.clone(),
                    Playback {
                        frame_index: 0,
                        paused: false,
                        remaining: Duration::ZERO,
                        token: CancelToken::default(),
                    },
                );
                log::debug!("Playing {} keyframes on {}", node.frames.len(), id);
                true
            }
            _ => false,
        }
    }

    /// Pause playback. The task keeps its place and resumes on [`Animator::play`].
    pub fn pause(&mut self, id: &NodeId) -> bool {
        match self.playing.get_mut(id) {
            Some(playback) => {
                playback.paused = true;
                true
            }
            None => false,
        }
    }

    /// Cancel playback entirely.
    pub fn stop(&mut self, id: &NodeId) -> bool {
        match self.playing.remove(id) {
            Some(playback) => {
                playback.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for playback in self.playing.values() {
            playback.token.cancel();
        }
        self.playing.clear();
        self.current.clear();
    }

    pub fn is_playing(&self, id: &NodeId) -> bool {
        self.playing.get(id).is_some_and(|p| !p.paused)
    }

    pub fn is_paused(&self, id: &NodeId) -> bool {
        self.playing.get(id).is_some_and(|p| p.paused)
    }

    pub fn playback(&self, id: &NodeId) -> Option<&Playback> {
        self.playing.get(id)
    }

    /// Cancellation token of the running task for `id`.
    pub fn token(&self, id: &NodeId) -> Option<CancelToken> {
        self.playing.get(id).map(|p| p.token.clone())
    }

    /// Advance every running task by `dt`, applying frames to the scene.
    ///
    /// Returns `true` if any node changed. Tasks whose node vanished are dropped.
    pub fn tick(&mut self, scene: &mut Scene, dt: Duration) -> bool {
        let mut changed = false;
        let mut finished = Vec::new();
        for (id, playback) in self.playing.iter_mut() {
            if playback.token.is_cancelled() {
                finished.push(id.clone());
                continue;
            }
            if playback.paused {
                continue;
            }
            let Some(node) = scene.find_mut(id) else {
                finished.push(id.clone());
                continue;
            };
            let mut budget = dt;
            loop {
                if playback.remaining > budget {
                    playback.remaining -= budget;
                    break;
                }
                budget -= playback.remaining;
                let Some(frame) = node.frames.get(playback.frame_index).copied() else {
                    finished.push(id.clone());
                    break;
                };
                node.x = frame.x;
                node.y = frame.y;
                node.set_rotation(frame.rotation);
                self.current.insert(id.clone(), playback.frame_index);
                changed = true;
                playback.frame_index += 1;
                playback.remaining = frame.hold();
                if playback.remaining.is_zero() && budget.is_zero() {
                    break;
                }
            }
        }
        for id in finished {
            log::debug!("Animation finished on {}", id);
            self.playing.remove(&id);
        }
        changed
    }

    /// The keyframe most recently applied to `id`.
    pub fn current_keyframe(&self, scene: &Scene, id: &NodeId) -> Option<Keyframe> {
        let index = *self.current.get(id)?;
        scene.find(id)?.frames.get(index).copied()
    }

    /// Sum of all keyframe durations, in milliseconds.
    pub fn total_duration(scene: &Scene, id: &NodeId) -> Option<f64> {
        let node = scene.find(id)?;
        if node.frames.is_empty() {
            return None;
        }
        Some(node.frames.iter().map(|f| f.duration).sum())
    }

    /// Give every keyframe of `id` the duration of one frame at `fps`.
    pub fn set_keyframes_per_second(scene: &mut Scene, id: &NodeId, fps: f64) -> bool {
        if fps <= 0.0 || !fps.is_finite() {
            return false;
        }
        match scene.find_mut(id) {
            Some(node) => {
                for frame in &mut node.frames {
                    frame.duration = 1000.0 / fps;
                }
                true
            }
            None => false,
        }
    }

    /// Append a keyframe to a node.
    pub fn add_keyframe(scene: &mut Scene, id: &NodeId, frame: Keyframe) -> bool {
        match scene.find_mut(id) {
            Some(node) => {
                node.frames.push(frame);
                true
            }
            None => false,
        }
    }

    /// Replace the keyframe at `index`.
    pub fn edit_keyframe(scene: &mut Scene, id: &NodeId, index: usize, frame: Keyframe) -> bool {
        match scene.find_mut(id).and_then(|n| n.frames.get_mut(index)) {
            Some(slot) => {
                *slot = frame;
                true
            }
            None => false,
        }
    }

    /// Remove the keyframe at `index`.
    pub fn remove_keyframe(scene: &mut Scene, id: &NodeId, index: usize) -> Option<Keyframe> {
        let node = scene.find_mut(id)?;
        (index < node.frames.len()).then(|| node.frames.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Node, NodeKind};

    fn scene_with_frames() -> Scene {
        let mut node = Node::new(NodeKind::Rectangle, 0.0, 0.0, "10px", "10px").with_id("n");
        node.frames = vec![
            Keyframe::new(10.0, 0.0, 0.0, 100.0),
            Keyframe::new(20.0, 5.0, 45.0, 100.0),
            Keyframe::new(30.0, 10.0, 90.0, 100.0),
        ];
        Scene::from_nodes(vec![node])
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_play_applies_frames_in_order() {
        let mut scene = scene_with_frames();
        let id = NodeId::from("n");
        let mut animator = Animator::new();
        assert!(animator.play(&scene, &id));

        assert!(animator.tick(&mut scene, Duration::ZERO));
        assert_eq!(scene.find(&id).unwrap().x, 10.0);
        assert!(!animator.tick(&mut scene, ms(50)));
        assert!(animator.tick(&mut scene, ms(50)));
        let node = scene.find(&id).unwrap();
        assert_eq!(node.x, 20.0);
        assert!((node.rotation() - 45.0).abs() < f64::EPSILON);
        assert_eq!(animator.current_keyframe(&scene, &id).unwrap().x, 20.0);

        animator.tick(&mut scene, ms(100));
        assert_eq!(scene.find(&id).unwrap().x, 30.0);
        animator.tick(&mut scene, ms(100));
        assert!(!animator.is_playing(&id));
        assert!(animator.playback(&id).is_none());
    }

    #[test]
    fn test_unrepresentable_durations() {
        let mut node = Node::new(NodeKind::Rectangle, 0.0, 0.0, "10px", "10px").with_id("n");
        node.frames = vec![
            Keyframe::new(1.0, 0.0, 0.0, f64::NAN),
            Keyframe::new(2.0, 0.0, 0.0, 1e25),
            Keyframe::new(3.0, 0.0, 0.0, f64::INFINITY),
        ];
        let mut scene = Scene::from_nodes(vec![node]);
        let id = NodeId::from("n");
        let mut animator = Animator::new();
        animator.play(&scene, &id);

        assert!(animator.tick(&mut scene, Duration::ZERO));
        assert_eq!(scene.find(&id).unwrap().x, 1.0);
        assert!(animator.tick(&mut scene, ms(16)));
        assert_eq!(scene.find(&id).unwrap().x, 2.0);
        assert!(!animator.tick(&mut scene, ms(16)));
        assert!(animator.is_playing(&id));
        assert_eq!(Keyframe::new(0.0, 0.0, 0.0, f64::INFINITY).hold(), Duration::MAX);
        assert_eq!(Keyframe::new(0.0, 0.0, 0.0, -5.0).hold(), Duration::ZERO);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut scene = scene_with_frames();
        let id = NodeId::from("n");
        let mut animator = Animator::new();
        animator.play(&scene, &id);
        animator.tick(&mut scene, Duration::ZERO);
        assert!(animator.pause(&id));
        assert!(animator.is_paused(&id));
        assert!(!animator.tick(&mut scene, ms(500)));
        assert_eq!(scene.find(&id).unwrap().x, 10.0);

        assert!(animator.play(&scene, &id));
        animator.tick(&mut scene, ms(100));
        assert_eq!(scene.find(&id).unwrap().x, 20.0);
    }

    #[test]
    fn test_stop_and_restart() {
        let mut scene = scene_with_frames();
        let id = NodeId::from("n");
        let mut animator = Animator::new();
        animator.play(&scene, &id);
        animator.tick(&mut scene, ms(150));
        assert!(animator.stop(&id));
        assert!(!animator.stop(&id));
        assert!(!animator.tick(&mut scene, ms(1000)));

        assert!(animator.animate(&scene, &id));
        assert_eq!(animator.playback(&id).unwrap().frame_index, 0);
    }

    #[test]
    fn test_cancel_token_stops_task() {
        let mut scene = scene_with_frames();
        let id = NodeId::from("n");
        let mut animator = Animator::new();
        animator.play(&scene, &id);
        let token = animator.token(&id).unwrap();
        token.cancel();
        assert!(!animator.tick(&mut scene, ms(1000)));
        assert!(animator.playback(&id).is_none());
        assert_eq!(scene.find(&id).unwrap().x, 0.0);

        animator.play(&scene, &id);
        let token = animator.token(&id).unwrap();
        animator.stop(&id);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_nothing_to_play() {
        let scene = Scene::from_nodes(vec![
            Node::new(NodeKind::Rectangle, 0.0, 0.0, "10px", "10px").with_id("bare"),
        ]);
        let mut animator = Animator::new();
        assert!(!animator.play(&scene, &"bare".into()));
        assert!(!animator.play(&scene, &"missing".into()));
        assert!(animator.current_keyframe(&scene, &"bare".into()).is_none());
        assert!(Animator::total_duration(&scene, &"bare".into()).is_none());
    }

    #[test]
    fn test_durations() {
        let mut scene = scene_with_frames();
        let id = NodeId::from("n");
        assert_eq!(Animator::total_duration(&scene, &id), Some(300.0));
        assert!(Animator::set_keyframes_per_second(&mut scene, &id, 4.0));
        assert_eq!(Animator::total_duration(&scene, &id), Some(750.0));
        assert!(!Animator::set_keyframes_per_second(&mut scene, &id, 0.0));
    }

    #[test]
    fn test_edit_keyframes() {
        let mut scene = scene_with_frames();
        let id = NodeId::from("n");
        assert!(Animator::edit_keyframe(&mut scene, &id, 1, Keyframe::new(1.0, 2.0, 3.0, 4.0)));
        assert!(!Animator::edit_keyframe(&mut scene, &id, 9, Keyframe::new(0.0, 0.0, 0.0, 0.0)));
        assert!(Animator::add_keyframe(&mut scene, &id, Keyframe::new(0.0, 0.0, 0.0, 10.0)));
        assert_eq!(scene.find(&id).unwrap().frames.len(), 4);
        let removed = Animator::remove_keyframe(&mut scene, &id, 1).unwrap();
        assert_eq!(removed.x, 1.0);
        assert!(Animator::remove_keyframe(&mut scene, &id, 10).is_none());
    }
}
