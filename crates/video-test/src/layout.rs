use crate::{ChromaSubsampling, FrameConfig, Result};

/// Addressing for a planar 4:2:2 image: a full-size luma plane and two chroma
/// planes at half horizontal resolution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlaneLayout {
    width: usize,
    height: usize,
}

impl PlaneLayout {
    pub fn new(config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            width: config.width as usize,
            height: config.height as usize,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn subsampling(&self) -> ChromaSubsampling {
        ChromaSubsampling::Ratio422
    }

    pub fn luma_len(&self) -> usize {
        self.width * self.height
    }

    pub fn chroma_len(&self) -> usize {
        self.width * self.height / 2
    }

    pub fn luma_stride(&self) -> usize {
        self.width
    }

    pub fn chroma_stride(&self) -> usize {
        self.width / 2
    }

    #[inline]
    pub fn luma_index(&self, x: usize, y: usize) -> usize {
        self.width * y + x
    }

    #[inline]
    pub fn chroma_index(&self, x: usize, y: usize) -> usize {
        self.width * y / 2 + x / 2
    }
}

/// Owned Y, Cb and Cr planes sized for a [`PlaneLayout`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Planes {
    pub y: Vec<u8>,
    pub cb: Vec<u8>,
    pub cr: Vec<u8>,
}

impl Planes {
    /// Zero-filled planes.
    pub fn new(layout: &PlaneLayout) -> Self {
        Self {
            y: vec![0u8; layout.luma_len()],
            cb: vec![0u8; layout.chroma_len()],
            cr: vec![0u8; layout.chroma_len()],
        }
    }

    /// Overwrite every plane with `src`. Both sides must come from the same layout.
    pub fn refresh_from(&mut self, src: &Planes) {
        self.y.copy_from_slice(&src.y);
        self.cb.copy_from_slice(&src.cb);
        self.cr.copy_from_slice(&src.cr);
    }
}
