use std::collections::HashMap;

use rayon::prelude::*;

use crate::foundation::core::Image;
use crate::foundation::error::{SdfError, SdfResult};
use crate::render::backend::{
    BufferDesc, BufferHandle, FilterMode, PassInput, PassKind, PassUniforms, RenderProgram,
    SdfBackend,
};

/// Options for the CPU backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackendOpts {
    /// Fail allocations that would push live buffer bytes past this limit.
    pub max_live_bytes: Option<usize>,
}

/// Allocation and pass counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CpuBackendStats {
    pub allocated: u64,
    pub released: u64,
    pub live_buffers: usize,
    pub live_bytes: usize,
    pub passes: u64,
    /// Releases of handles that were not live.
    pub stray_releases: u64,
}

struct CpuBuffer {
    desc: BufferDesc,
    texels: Vec<[f32; 4]>,
}

/// Reference backend that runs every pass as a per-pixel loop over in-memory texels.
///
/// Texels are kept as `f32` and quantized to the buffer's format on write. Color spaces are
/// carried as tags; no transfer function is applied on read or write. Rows are processed in
/// parallel, each output texel depends only on the pass inputs.
pub struct CpuBackend {
    opts: CpuBackendOpts,
    stats: CpuBackendStats,
    next_id: u64,
    buffers: HashMap<BufferHandle, CpuBuffer>,
}

impl CpuBackend {
    pub fn new(opts: CpuBackendOpts) -> Self {
        Self {
            opts,
            stats: CpuBackendStats::default(),
            next_id: 1,
            buffers: HashMap::new(),
        }
    }

    pub fn stats(&self) -> CpuBackendStats {
        self.stats.clone()
    }

    fn buffer(&self, handle: BufferHandle) -> SdfResult<&CpuBuffer> {
        self.buffers
            .get(&handle)
            .ok_or_else(|| SdfError::pass(format!("unknown buffer {handle:?}")))
    }

    /// Detach `write` so it can be filled while other buffers are borrowed.
    fn take_target(&mut self, write: BufferHandle) -> SdfResult<CpuBuffer> {
        self.buffers
            .remove(&write)
            .ok_or_else(|| SdfError::pass(format!("unknown target buffer {write:?}")))
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(CpuBackendOpts::default())
    }
}

impl SdfBackend for CpuBackend {
    fn allocate_buffer(&mut self, desc: &BufferDesc) -> SdfResult<BufferHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(SdfError::allocation(format!(
                "cannot allocate {}x{} buffer",
                desc.width, desc.height
            )));
        }
        // Seed coordinates are stored as 16-bit integers.
        if desc.width > u16::MAX as u32 || desc.height > u16::MAX as u32 {
            return Err(SdfError::allocation(format!(
                "buffer {}x{} exceeds {} px per side",
                desc.width,
                desc.height,
                u16::MAX
            )));
        }
        let bytes = desc.byte_len();
        if let Some(limit) = self.opts.max_live_bytes
            && self.stats.live_bytes.saturating_add(bytes) > limit
        {
            return Err(SdfError::allocation(format!(
                "{bytes} bytes requested with {} of {limit} live",
                self.stats.live_bytes
            )));
        }

        let handle = BufferHandle(self.next_id);
        self.next_id += 1;
        let len = (desc.width as usize) * (desc.height as usize);
        self.buffers.insert(
            handle,
            CpuBuffer {
                desc: *desc,
                texels: vec![[0.0; 4]; len],
            },
        );
        self.stats.allocated += 1;
        self.stats.live_buffers += 1;
        self.stats.live_bytes += bytes;
        Ok(handle)
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(&buffer) {
            Some(b) => {
                self.stats.released += 1;
                self.stats.live_buffers -= 1;
                self.stats.live_bytes -= b.desc.byte_len();
            }
            None => {
                tracing::warn!(?buffer, "release of a buffer that is not live");
                self.stats.stray_releases += 1;
            }
        }
    }

    fn run_pass(
        &mut self,
        program: &RenderProgram,
        pass: PassKind,
        uniforms: &PassUniforms<'_>,
        read: PassInput<'_>,
        write: BufferHandle,
    ) -> SdfResult<()> {
        if !program.has_pass(pass) {
            return Err(SdfError::pass(format!(
                "program '{}' has no {pass:?} variant",
                program.label
            )));
        }
        if uniforms.channel > 3 {
            return Err(SdfError::pass(format!(
                "channel {} out of range",
                uniforms.channel
            )));
        }
        if !uniforms.spread.is_finite() {
            return Err(SdfError::pass(format!(
                "spread {} is not finite",
                uniforms.spread
            )));
        }
        if matches!(read, PassInput::Buffer(h) if h == write) {
            return Err(SdfError::pass("a pass cannot read and write the same buffer"));
        }

        let mut target = self.take_target(write)?;
        let result = self.fill_pass(program, pass, uniforms, read, &mut target);
        self.buffers.insert(write, target);
        if result.is_ok() {
            self.stats.passes += 1;
        }
        result
    }

    fn blit(&mut self, src: BufferHandle, dst: BufferHandle) -> SdfResult<()> {
        if src == dst {
            return Err(SdfError::pass("blit source and destination must differ"));
        }
        let mut target = self.take_target(dst)?;
        let result = self.buffer(src).map(|source| {
            let view = TexelView::Buffer(source);
            let (dw, dh) = (target.desc.width, target.desc.height);
            let filter = target.desc.filter;
            let scale_x = view.width() as f32 / dw as f32;
            let scale_y = view.height() as f32 / dh as f32;
            fill_texels(&mut target, |x, y| {
                let u = (x as f32 + 0.5) * scale_x - 0.5;
                let v = (y as f32 + 0.5) * scale_y - 0.5;
                match filter {
                    FilterMode::Point => view.fetch(u.round() as i64, v.round() as i64),
                    FilterMode::Bilinear => view.sample_bilinear(u, v),
                }
            });
        });
        self.buffers.insert(dst, target);
        if result.is_ok() {
            self.stats.passes += 1;
        }
        result
    }

    fn merge_channel(
        &mut self,
        src: BufferHandle,
        dst: BufferHandle,
        channel: usize,
    ) -> SdfResult<()> {
        if channel > 3 {
            return Err(SdfError::pass(format!("channel {channel} out of range")));
        }
        if src == dst {
            return Err(SdfError::pass("merge source and destination must differ"));
        }
        let mut target = self.take_target(dst)?;
        let result = self.buffer(src).and_then(|source| {
            if (source.desc.width, source.desc.height) != (target.desc.width, target.desc.height)
            {
                return Err(SdfError::pass("merge buffers differ in size"));
            }
            let max = target.desc.format.max_value();
            for (d, s) in target.texels.iter_mut().zip(&source.texels) {
                d[channel] = quantize(s[channel], max);
            }
            Ok(())
        });
        self.buffers.insert(dst, target);
        result
    }

    fn read_back(&mut self, buffer: BufferHandle) -> SdfResult<Image> {
        let b = self.buffer(buffer)?;
        let mut data = Vec::with_capacity(b.texels.len() * 4);
        for t in &b.texels {
            for &v in t {
                data.push((v.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        Image::from_rgba8(b.desc.width, b.desc.height, data, b.desc.color_space)
    }
}

impl CpuBackend {
    fn fill_pass(
        &self,
        program: &RenderProgram,
        pass: PassKind,
        uniforms: &PassUniforms<'_>,
        read: PassInput<'_>,
        target: &mut CpuBuffer,
    ) -> SdfResult<()> {
        let view = match read {
            PassInput::Image(img) => TexelView::Image(checked_image(img, "pass input")?),
            PassInput::Buffer(h) => TexelView::Buffer(self.buffer(h)?),
        };
        if (view.width(), view.height()) != (target.desc.width, target.desc.height) {
            return Err(SdfError::pass(format!(
                "pass input is {}x{} but target is {}x{}",
                view.width(),
                view.height(),
                target.desc.width,
                target.desc.height
            )));
        }

        let channel = uniforms.channel;
        let threshold = program.threshold;
        // Offsets past the larger side all clamp to the border.
        let max_side = i64::from(view.width().max(view.height()));
        let spread = (uniforms.spread.round().max(1.0) as i64).min(max_side);

        match (pass, uniforms.first_pass) {
            (PassKind::Flood, true) => {
                fill_texels(target, |x, y| edge_texel(&view, x, y, spread, channel, threshold));
            }
            (PassKind::Flood, false) => {
                fill_texels(target, |x, y| propagate_texel(&view, x, y, spread));
            }
            (PassKind::Final, _) => {
                let source = uniforms
                    .source
                    .ok_or_else(|| SdfError::pass("final pass requires a source texture"))?;
                let source = checked_image(source, "source texture")?;
                if (source.width, source.height) != (target.desc.width, target.desc.height) {
                    return Err(SdfError::pass("source texture size does not match target"));
                }
                let source = TexelView::Image(source);
                let feather_px = program.feather * view.width().max(view.height()) as f32;
                fill_texels(target, |x, y| {
                    final_texel(&view, &source, x, y, channel, threshold, feather_px)
                });
            }
        }
        Ok(())
    }
}

fn checked_image<'a>(img: &'a Image, role: &str) -> SdfResult<&'a Image> {
    img.validate()
        .map_err(|e| SdfError::pass(format!("{role}: {e}")))?;
    Ok(img)
}

/// Read-only pixel source with clamped nearest-neighbor addressing.
enum TexelView<'a> {
    Image(&'a Image),
    Buffer(&'a CpuBuffer),
}

impl TexelView<'_> {
    fn width(&self) -> u32 {
        match self {
            Self::Image(img) => img.width,
            Self::Buffer(b) => b.desc.width,
        }
    }

    fn height(&self) -> u32 {
        match self {
            Self::Image(img) => img.height,
            Self::Buffer(b) => b.desc.height,
        }
    }

    fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, i64::from(self.width()) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height()) - 1) as u32;
        match self {
            Self::Image(img) => img.pixel(x, y).map(|v| f32::from(v) / 255.0),
            Self::Buffer(b) => b.texels[(y as usize) * (b.desc.width as usize) + (x as usize)],
        }
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        let (x0, y0) = (u.floor(), v.floor());
        let (fx, fy) = (u - x0, v - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let a = self.fetch(x0, y0);
        let b = self.fetch(x0 + 1, y0);
        let c = self.fetch(x0, y0 + 1);
        let d = self.fetch(x0 + 1, y0 + 1);
        std::array::from_fn(|i| {
            let top = a[i] + (b[i] - a[i]) * fx;
            let bottom = c[i] + (d[i] - c[i]) * fx;
            top + (bottom - top) * fy
        })
    }
}

fn fill_texels<F>(target: &mut CpuBuffer, f: F)
where
    F: Fn(i64, i64) -> [f32; 4] + Sync,
{
    let width = target.desc.width as usize;
    let max = target.desc.format.max_value();
    target
        .texels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.iter_mut().enumerate() {
                *texel = f(x as i64, y as i64).map(|v| quantize(v, max));
            }
        });
}

fn quantize(v: f32, max: f32) -> f32 {
    (v.clamp(0.0, 1.0) * max).round() / max
}

const SEED_SCALE: f32 = 65535.0;
const NEIGHBORS_4: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

fn is_inside(texel: [f32; 4], channel: usize, threshold: f32) -> bool {
    texel[channel] >= threshold
}

/// Flood texel layout: `r, g` seed coordinates over 65535, `b` seed present, `a` inside.
fn encode_seed(seed: Option<(i64, i64)>, inside: bool) -> [f32; 4] {
    let a = if inside { 1.0 } else { 0.0 };
    match seed {
        Some((sx, sy)) => [sx as f32 / SEED_SCALE, sy as f32 / SEED_SCALE, 1.0, a],
        None => [0.0, 0.0, 0.0, a],
    }
}

fn decode_seed(texel: [f32; 4]) -> Option<(i64, i64)> {
    (texel[2] >= 0.5).then(|| {
        (
            (texel[0] * SEED_SCALE).round() as i64,
            (texel[1] * SEED_SCALE).round() as i64,
        )
    })
}

fn dist2(x: i64, y: i64, seed: (i64, i64)) -> i64 {
    let dx = seed.0 - x;
    let dy = seed.1 - y;
    dx * dx + dy * dy
}

fn edge_texel(
    view: &TexelView<'_>,
    x: i64,
    y: i64,
    spread: i64,
    channel: usize,
    threshold: f32,
) -> [f32; 4] {
    let inside = is_inside(view.fetch(x, y), channel, threshold);
    let edge = NEIGHBORS_4.iter().any(|&(dx, dy)| {
        is_inside(view.fetch(x + dx * spread, y + dy * spread), channel, threshold) != inside
    });
    encode_seed(edge.then_some((x, y)), inside)
}

fn propagate_texel(view: &TexelView<'_>, x: i64, y: i64, spread: i64) -> [f32; 4] {
    let own = view.fetch(x, y);
    let mut best = decode_seed(own).map(|s| (s, dist2(x, y, s)));
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(seed) = decode_seed(view.fetch(x + dx * spread, y + dy * spread)) else {
                continue;
            };
            let d = dist2(x, y, seed);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((seed, d));
            }
        }
    }
    encode_seed(best.map(|(s, _)| s), own[3] >= 0.5)
}

fn final_texel(
    flood: &TexelView<'_>,
    source: &TexelView<'_>,
    x: i64,
    y: i64,
    channel: usize,
    threshold: f32,
    feather_px: f32,
) -> [f32; 4] {
    let inside = is_inside(source.fetch(x, y), channel, threshold);
    let dist = decode_seed(flood.fetch(x, y))
        .map(|s| (dist2(x, y, s) as f32).sqrt() + 0.5)
        .unwrap_or(f32::INFINITY);
    let signed = if inside { dist } else { -dist };
    let mut out = [0.0; 4];
    out[channel] = (0.5 + signed / (2.0 * feather_px)).clamp(0.0, 1.0);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
