use glam::{Quat, Vec3};

use super::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Values are stored as (in-tangent, value, out-tangent) triplets
    CubicSpline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// Keyframes driving one property of one node
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationChannel {
    pub node: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Seconds; the largest keyframe time over all channels
    pub duration: f32,
    pub channels: Vec<AnimationChannel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
        }
    }

    /// Write the pose at `time` into the model's node-local transforms
    pub fn apply(&self, time: f32, model: &mut Model) {
        for channel in &self.channels {
            let Some(node) = model.nodes.get_mut(channel.node) else {
                continue;
            };
            if channel.times.is_empty() {
                continue;
            }
            match &channel.values {
                ChannelValues::Translation(v) => {
                    node.local.translation = sample_vec3(&channel.times, v, channel.interpolation, time);
                }
                ChannelValues::Scale(v) => {
                    node.local.scale = sample_vec3(&channel.times, v, channel.interpolation, time);
                }
                ChannelValues::Rotation(v) => {
                    node.local.rotation = sample_quat(&channel.times, v, channel.interpolation, time);
                }
            }
        }
    }
}

/// Plays a single clip on a single model, repeating forever
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clip: AnimationClip,
    clip_index: usize,
    time: f32,
}

impl AnimationPlayer {
    pub fn new(clip: AnimationClip, clip_index: usize) -> Self {
        Self {
            clip,
            clip_index,
            time: 0.0,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Position of the played clip in the asset's clip list
    pub fn clip_index(&self) -> usize {
        self.clip_index
    }

    /// Local clip time in seconds, always within [0, duration)
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance by `delta` seconds and pose the model
    pub fn update(&mut self, delta: f32, model: &mut Model) {
        let duration = self.clip.duration;
        self.time = if duration > 0.0 {
            (self.time + delta).rem_euclid(duration)
        } else {
            0.0
        };
        self.clip.apply(self.time, model);
    }
}

/// Surrounding keyframes for a time, clamped to the first/last key
struct Segment {
    prev: usize,
    next: usize,
    /// Normalized position between prev and next
    s: f32,
    /// Seconds between prev and next
    dt: f32,
}

fn locate(times: &[f32], t: f32) -> Segment {
    let last = times.len() - 1;
    if t <= times[0] || last == 0 {
        return Segment { prev: 0, next: 0, s: 0.0, dt: 0.0 };
    }
    if t >= times[last] {
        return Segment { prev: last, next: last, s: 0.0, dt: 0.0 };
    }
    // First key strictly after t
    let next = times.partition_point(|&k| k <= t);
    let prev = next - 1;
    let dt = times[next] - times[prev];
    let s = if dt > 0.0 { (t - times[prev]) / dt } else { 0.0 };
    Segment { prev, next, s, dt }
}

fn hermite<T>(p0: T, m0: T, p1: T, m1: T, s: f32) -> T
where
    T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    let s2 = s * s;
    let s3 = s2 * s;
    p0 * (2.0 * s3 - 3.0 * s2 + 1.0)
        + m0 * (s3 - 2.0 * s2 + s)
        + p1 * (-2.0 * s3 + 3.0 * s2)
        + m1 * (s3 - s2)
}

fn keyed<T: Copy>(values: &[T], interpolation: Interpolation, key: usize) -> T {
    match interpolation {
        Interpolation::CubicSpline => values[key * 3 + 1],
        _ => values[key],
    }
}

pub fn sample_vec3(times: &[f32], values: &[Vec3], interpolation: Interpolation, t: f32) -> Vec3 {
    let seg = locate(times, t);
    if seg.prev == seg.next {
        return keyed(values, interpolation, seg.prev);
    }
    match interpolation {
        Interpolation::Step => values[seg.prev],
        Interpolation::Linear => values[seg.prev].lerp(values[seg.next], seg.s),
        Interpolation::CubicSpline => {
            let p0 = values[seg.prev * 3 + 1];
            let m0 = values[seg.prev * 3 + 2] * seg.dt;
            let p1 = values[seg.next * 3 + 1];
            let m1 = values[seg.next * 3] * seg.dt;
            hermite(p0, m0, p1, m1, seg.s)
        }
    }
}

pub fn sample_quat(times: &[f32], values: &[Quat], interpolation: Interpolation, t: f32) -> Quat {
    let seg = locate(times, t);
    if seg.prev == seg.next {
        return keyed(values, interpolation, seg.prev).normalize();
    }
    match interpolation {
        Interpolation::Step => values[seg.prev],
        Interpolation::Linear => values[seg.prev].slerp(values[seg.next], seg.s),
        Interpolation::CubicSpline => {
            let p0 = values[seg.prev * 3 + 1];
            let m0 = values[seg.prev * 3 + 2] * seg.dt;
            let p1 = values[seg.next * 3 + 1];
            let m1 = values[seg.next * 3] * seg.dt;
            hermite(p0, m0, p1, m1, seg.s).normalize()
        }
    }
}
