use glam::{Quat, Vec3, Vec4};
use gltf::animation::Interpolation;

use crate::rig::shared::enums::PathSegment;

#[derive(Clone, Debug)]
pub enum ChannelOutputs {
    Translations(Vec<Vec3>),
    Rotations(Vec<Quat>),
    Scales(Vec<Vec3>),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ChannelValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

#[derive(Clone, Debug)]
pub struct Channel {
    pub inputs: Vec<f32>,
    pub outputs: ChannelOutputs,
    pub interpolation: Interpolation,
}

#[derive(Clone, Debug)]
pub struct Track {
    pub path: Vec<PathSegment>,
    pub channel: Channel,
}

impl Track {
    pub fn new(joint_path: &str, channel: Channel) -> Self {
        Track {
            path: vec![PathSegment::Hierarchy(joint_path.to_string())],
            channel,
        }
    }

    /// The joint path this track drives, if its first segment is one.
    pub fn hierarchy_path(&self) -> Option<&str> {
        self.path.first().and_then(|segment| segment.hierarchy_path())
    }
}

#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    pub fn new(name: &str, tracks: Vec<Track>) -> Self {
        AnimationClip {
            name: name.to_string(),
            tracks,
        }
    }

    /// Time of the last keyframe over all tracks, in seconds.
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(|track| track.channel.inputs.last().copied())
            .fold(0.0, f32::max)
    }
}

macro_rules! interpolate {
    ($p0: expr, $p1: expr, $m0: expr, $m1: expr, $time: expr) => {{
        let t_pow2 = $time * $time;
        let t_pow3 = t_pow2 * $time;
        (2.0 * t_pow3 - 3.0 * t_pow2 + 1.0) * $p0
            + (t_pow3 - 2.0 * t_pow2 + $time) * $m0
            + (-2.0 * t_pow3 + 3.0 * t_pow2) * $p1
            + (t_pow3 - t_pow2) * $m1
    }};
}

impl Channel {
    pub fn sample(&self, seconds: f32) -> Option<ChannelValue> {
        if self.inputs.is_empty() {
            return None;
        }
        match (&self.outputs, self.interpolation) {
            (ChannelOutputs::Translations(values), Interpolation::CubicSpline) => {
                sample_cubic_vec3(&self.inputs, values, seconds).map(ChannelValue::Translation)
            }
            (ChannelOutputs::Translations(values), interpolation) => {
                sample_vec3(&self.inputs, values, interpolation, seconds)
                    .map(ChannelValue::Translation)
            }
            (ChannelOutputs::Scales(values), Interpolation::CubicSpline) => {
                sample_cubic_vec3(&self.inputs, values, seconds).map(ChannelValue::Scale)
            }
            (ChannelOutputs::Scales(values), interpolation) => {
                sample_vec3(&self.inputs, values, interpolation, seconds).map(ChannelValue::Scale)
            }
            (ChannelOutputs::Rotations(rotations), Interpolation::CubicSpline) => {
                let rotation = match index_cubic_spline(&self.inputs, seconds) {
                    CubicSplineIndex::Clamped { index } => *rotations.get(index * 3 + 1)?,
                    CubicSplineIndex::Interpolate {
                        index_prev,
                        index_next,
                        time,
                        range,
                    } => {
                        // previous spline vertex
                        let p0 = Vec4::from(*rotations.get(index_prev * 3 + 1)?);
                        // next spline vertex
                        let p1 = Vec4::from(*rotations.get(index_next * 3 + 1)?);
                        // previous output tangent
                        let m0 = Vec4::from(*rotations.get(index_prev * 3 + 2)?) * range;
                        // next output tangent
                        let m1 = Vec4::from(*rotations.get(index_next * 3)?) * range;
                        let result: Vec4 = interpolate!(p0, p1, m0, m1, time);
                        Quat::from_vec4(result)
                    }
                };
                Some(ChannelValue::Rotation(rotation.normalize()))
            }
            (ChannelOutputs::Rotations(rotations), Interpolation::Linear) => {
                let (index_prev, index_next, amount) = index_linear(&self.inputs, seconds);
                let prev = *rotations.get(index_prev)?;
                let next = *rotations.get(index_next)?;
                Some(ChannelValue::Rotation(prev.slerp(next, amount)))
            }
            (ChannelOutputs::Rotations(rotations), Interpolation::Step) => {
                let index = index_step(&self.inputs, seconds);
                rotations.get(index).copied().map(ChannelValue::Rotation)
            }
        }
    }
}

fn sample_vec3(
    inputs: &[f32],
    values: &[Vec3],
    interpolation: Interpolation,
    seconds: f32,
) -> Option<Vec3> {
    match interpolation {
        Interpolation::Step => values.get(index_step(inputs, seconds)).copied(),
        _ => {
            let (index_prev, index_next, amount) = index_linear(inputs, seconds);
            let prev = *values.get(index_prev)?;
            let next = *values.get(index_next)?;
            Some(prev.lerp(next, amount))
        }
    }
}

fn sample_cubic_vec3(inputs: &[f32], values: &[Vec3], seconds: f32) -> Option<Vec3> {
    match index_cubic_spline(inputs, seconds) {
        CubicSplineIndex::Clamped { index } => values.get(index * 3 + 1).copied(),
        CubicSplineIndex::Interpolate {
            index_prev,
            index_next,
            time,
            range,
        } => {
            let p0 = *values.get(index_prev * 3 + 1)?;
            let p1 = *values.get(index_next * 3 + 1)?;
            let m0 = *values.get(index_prev * 3 + 2)? * range;
            let m1 = *values.get(index_next * 3)? * range;
            let result: Vec3 = interpolate!(p0, p1, m0, m1, time);
            Some(result)
        }
    }
}

fn index_step(inputs: &[f32], seconds: f32) -> usize {
    if inputs.len() < 2 || seconds < inputs[0] {
        return 0;
    }
    for (i, window) in inputs.windows(2).enumerate() {
        if seconds >= window[0] && seconds < window[1] {
            return i;
        }
    }
    inputs.len() - 1
}

fn index_linear(inputs: &[f32], seconds: f32) -> (usize, usize, f32) {
    if inputs.len() < 2 || seconds < inputs[0] {
        return (0, 0, 0.0);
    }
    for (i, window) in inputs.windows(2).enumerate() {
        let input_prev = window[0];
        let input_next = window[1];
        if seconds >= input_prev && seconds < input_next {
            let amount = (seconds - input_prev) / (input_next - input_prev);
            return (i, i + 1, amount);
        }
    }
    let last = inputs.len() - 1;
    (last, last, 0.0)
}

enum CubicSplineIndex {
    Clamped {
        index: usize,
    },
    Interpolate {
        index_prev: usize,
        index_next: usize,
        time: f32,
        range: f32,
    },
}

fn index_cubic_spline(inputs: &[f32], seconds: f32) -> CubicSplineIndex {
    if inputs.len() < 2 || seconds < inputs[0] {
        return CubicSplineIndex::Clamped { index: 0 };
    }
    for (i, window) in inputs.windows(2).enumerate() {
        let input_prev = window[0];
        let input_next = window[1];
        if seconds >= input_prev && seconds < input_next {
            let range = input_next - input_prev;
            let time = (seconds - input_prev) / range;
            return CubicSplineIndex::Interpolate {
                index_prev: i,
                index_next: i + 1,
                time,
                range,
            };
        }
    }
    CubicSplineIndex::Clamped {
        index: inputs.len() - 1,
    }
}
