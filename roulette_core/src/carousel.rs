use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::item::ItemSet;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarouselParams {
    /// Lower bound on frames materialised per safety traversal block.
    pub min_buffer_frames: usize,
    pub safety_factor: usize,
}

impl Default for CarouselParams {
    fn default() -> Self {
        Self {
            min_buffer_frames: 40,
            safety_factor: 2,
        }
    }
}

impl CarouselParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.min_buffer_frames == 0 {
            return Err(CoreError::InvalidParams("min_buffer_frames must be >= 1"));
        }
        if self.safety_factor == 0 {
            return Err(CoreError::InvalidParams("safety_factor must be >= 1"));
        }
        Ok(())
    }

    /// Repeats needed so one block of traversals covers the buffer.
    pub fn repeat_count(&self, item_count: usize) -> usize {
        self.min_buffer_frames.div_ceil(item_count.max(1))
    }
}

/// One visual slot of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub position: usize,
    pub item_index: usize,
}

/// The repeated strip. Positionally fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameList {
    frames: Vec<Frame>,
    item_count: usize,
    traversals: usize,
}

impl FrameList {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn traversals(&self) -> usize {
        self.traversals
    }

    pub fn get(&self, position: usize) -> Option<&Frame> {
        self.frames.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CarouselBuilder {
    params: CarouselParams,
}

impl CarouselBuilder {
    pub fn new(params: CarouselParams) -> Result<Self, CoreError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &CarouselParams {
        &self.params
    }

    /// Lays out `repeat_count * safety_factor` full traversals of `items`.
    pub fn build(&self, items: &ItemSet) -> FrameList {
        let item_count = items.len();
        let traversals = self.params.repeat_count(item_count) * self.params.safety_factor;
        let frames = (0..traversals * item_count)
            .map(|position| Frame {
                position,
                item_index: position % item_count,
            })
            .collect();
        FrameList {
            frames,
            item_count,
            traversals,
        }
    }
}
