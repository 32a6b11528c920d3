//! Turning the DB probability map into text boxes
//!
//! The map is binarised, split into 8-connected components, and each
//! component becomes an axis-aligned box. Weak or tiny components are
//! dropped; survivors are expanded ("unclipped") because DB models predict a
//! shrunken text kernel, then mapped back to source image pixels.

use std::collections::VecDeque;

use crate::config::OcrConfig;

/// Smallest side, in map pixels, of a kept box
const MIN_BOX_SIDE: f32 = 3.0;

/// Upper bound on components considered per image
const MAX_CANDIDATES: usize = 1000;

/// Post-processing thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbParams {
    /// Pixel probability above which a pixel is text
    pub det_threshold: f32,
    /// Minimum mean probability over a component
    pub box_threshold: f32,
    /// Expansion factor applied to each kept box
    pub unclip_ratio:  f32,
}

impl From<&OcrConfig> for DbParams {
    fn from(config: &OcrConfig) -> Self {
        Self {
            det_threshold: config.det_threshold,
            box_threshold: config.box_threshold,
            unclip_ratio:  config.unclip_ratio,
        }
    }
}

impl Default for DbParams {
    fn default() -> Self {
        Self::from(&OcrConfig::default())
    }
}

/// Detected text region in source image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetBox {
    pub left:   f32,
    pub top:    f32,
    pub right:  f32,
    pub bottom: f32,
    /// Mean probability of the component
    pub score:  f32,
}

impl DetBox {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy)]
struct Component {
    min_x:    usize,
    min_y:    usize,
    max_x:    usize,
    max_y:    usize,
    prob_sum: f32,
    pixels:   usize,
}

/// Extracts boxes from a `map_width` x `map_height` probability map
///
/// Coordinates are scaled from map space to an `image_width` x
/// `image_height` source image.
pub fn extract_boxes(
    probs: &[f32],
    map_width: usize,
    map_height: usize,
    image_width: u32,
    image_height: u32,
    params: DbParams,
) -> Vec<DetBox> {
    if map_width == 0 || map_height == 0 || probs.len() < map_width * map_height {
        return Vec::new();
    }

    let scale_x = image_width as f32 / map_width as f32;
    let scale_y = image_height as f32 / map_height as f32;

    connected_components(probs, map_width, map_height, params.det_threshold)
        .into_iter()
        .take(MAX_CANDIDATES)
        .filter_map(|component| {
            let score = component.prob_sum / component.pixels as f32;
            if score < params.box_threshold {
                return None;
            }

            let width = (component.max_x - component.min_x + 1) as f32;
            let height = (component.max_y - component.min_y + 1) as f32;
            if width.min(height) < MIN_BOX_SIDE {
                return None;
            }

            let distance = unclip_distance(width, height, params.unclip_ratio);
            let (width, height) = (width + 2.0 * distance, height + 2.0 * distance);
            if width.min(height) < MIN_BOX_SIDE + 2.0 {
                return None;
            }

            let left = component.min_x as f32 - distance;
            let top = component.min_y as f32 - distance;
            Some(DetBox {
                left: (left * scale_x).clamp(0.0, image_width as f32),
                top: (top * scale_y).clamp(0.0, image_height as f32),
                right: ((left + width) * scale_x).clamp(0.0, image_width as f32),
                bottom: ((top + height) * scale_y).clamp(0.0, image_height as f32),
                score,
            })
        })
        .collect()
}

/// Offset that grows a `width` x `height` box by `area * ratio / perimeter`
pub fn unclip_distance(width: f32, height: f32, ratio: f32) -> f32 {
    let perimeter = 2.0 * (width + height);
    if perimeter <= 0.0 {
        return 0.0;
    }
    width * height * ratio / perimeter
}

fn connected_components(probs: &[f32], width: usize, height: usize, threshold: f32) -> Vec<Component> {
    let mut visited = vec![false; width * height];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..width * height {
        if visited[start] || probs[start] <= threshold {
            continue;
        }

        visited[start] = true;
        queue.push_back(start);
        let mut component = Component {
            min_x:    start % width,
            min_y:    start / width,
            max_x:    start % width,
            max_y:    start / width,
            prob_sum: 0.0,
            pixels:   0,
        };

        while let Some(index) = queue.pop_front() {
            let (x, y) = (index % width, index / width);
            component.min_x = component.min_x.min(x);
            component.max_x = component.max_x.max(x);
            component.min_y = component.min_y.min(y);
            component.max_y = component.max_y.max(y);
            component.prob_sum += probs[index];
            component.pixels += 1;

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    let neighbour = ny as usize * width + nx as usize;
                    if !visited[neighbour] && probs[neighbour] > threshold {
                        visited[neighbour] = true;
                        queue.push_back(neighbour);
                    }
                }
            }
        }

        components.push(component);
    }

    components
}
