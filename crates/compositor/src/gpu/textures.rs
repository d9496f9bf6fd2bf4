use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::assets::{spawn_decode, AssetRef, CancelToken, DecodedImage, LoadState, PendingDecode};
use crate::error::CompositorError;

/// Opaque black, shown until (or instead of) the decoded image.
const PLACEHOLDER_TEXEL: [u8; 4] = [0, 0, 0, 255];

/// The two textures the composite pass samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextureSlot {
    Foreground,
    Background,
}

impl TextureSlot {
    fn label(self) -> &'static str {
        match self {
            TextureSlot::Foreground => "foreground",
            TextureSlot::Background => "background",
        }
    }
}

/// Readiness of a texture handle; a pending handle owns its decode.
#[derive(Debug)]
pub(crate) enum TextureState {
    Pending(PendingDecode),
    Ready,
    Failed,
}

/// What the render thread should do with a handle after a poll.
#[derive(Debug)]
pub(crate) enum TextureUpdate {
    Wait,
    Upload(DecodedImage),
    KeepPlaceholder(CompositorError),
}

/// Maps one observed decode state to the action for its texture.
pub(crate) fn resolve_load(asset: &AssetRef, load: LoadState, max_dimension: u32) -> TextureUpdate {
    match load {
        LoadState::Pending => TextureUpdate::Wait,
        LoadState::Ready(image) if image.width > max_dimension || image.height > max_dimension => {
            TextureUpdate::KeepPlaceholder(CompositorError::AssetLoadFailed {
                asset: asset.to_string(),
                reason: format!(
                    "{}x{} exceeds the GPU texture limit of {max_dimension}",
                    image.width, image.height
                ),
            })
        }
        LoadState::Ready(image) => TextureUpdate::Upload(image),
        LoadState::Failed(reason) => {
            TextureUpdate::KeepPlaceholder(CompositorError::AssetLoadFailed {
                asset: asset.to_string(),
                reason,
            })
        }
    }
}

/// GPU-free half of a texture handle: the slot and its load progress.
#[derive(Debug)]
pub(crate) struct TextureLoad {
    slot: TextureSlot,
    state: TextureState,
}

impl TextureLoad {
    fn new(slot: TextureSlot, pending: PendingDecode) -> Self {
        Self {
            slot,
            state: TextureState::Pending(pending),
        }
    }

    /// Advances a pending load; settled loads always return `Wait`.
    ///
    /// A failure is logged once and the handle stays on its placeholder.
    fn poll(&mut self, max_dimension: u32) -> TextureUpdate {
        let TextureState::Pending(pending) = &self.state else {
            return TextureUpdate::Wait;
        };
        let asset = pending.asset().clone();
        let update = resolve_load(&asset, pending.poll(), max_dimension);
        match &update {
            TextureUpdate::Wait => {}
            TextureUpdate::Upload(image) => {
                tracing::info!(
                    slot = self.slot.label(),
                    %asset,
                    width = image.width,
                    height = image.height,
                    "texture ready"
                );
                self.state = TextureState::Ready;
            }
            TextureUpdate::KeepPlaceholder(error) => {
                tracing::warn!(slot = self.slot.label(), %error, "keeping placeholder texture");
                self.state = TextureState::Failed;
            }
        }
        update
    }
}

/// A stable binding point whose pixels are swapped in once decoding finishes.
pub(crate) struct TextureHandle {
    load: TextureLoad,
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureHandle {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: TextureSlot,
        pending: PendingDecode,
    ) -> Self {
        let texture = upload(device, queue, slot, 1, 1, &PLACEHOLDER_TEXEL);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(slot.label()),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            load: TextureLoad::new(slot, pending),
            texture,
            view,
            sampler,
        }
    }

    /// Returns true when new pixels were bound and bind groups must be rebuilt.
    fn poll(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let max_dimension = device.limits().max_texture_dimension_2d;
        match self.load.poll(max_dimension) {
            TextureUpdate::Upload(image) => {
                self.replace(device, queue, &image);
                true
            }
            TextureUpdate::Wait | TextureUpdate::KeepPlaceholder(_) => false,
        }
    }

    fn replace(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, image: &DecodedImage) {
        self.texture = upload(
            device,
            queue,
            self.load.slot,
            image.width,
            image.height,
            &image.rgba,
        );
        self.view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
    }
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    slot: TextureSlot,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::Texture {
    device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(slot.label()),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        rgba,
    )
}

/// Foreground and background textures plus their in-flight decodes.
///
/// Dropping the cache cancels any decode still running; a worker that
/// finishes afterwards discards its pixels.
pub(crate) struct TextureCache {
    token: CancelToken,
    foreground: TextureHandle,
    background: TextureHandle,
}

impl TextureCache {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        foreground: AssetRef,
        background: AssetRef,
    ) -> Self {
        let token = CancelToken::new();
        let load = |slot: TextureSlot, asset: AssetRef| {
            tracing::debug!(slot = slot.label(), %asset, "decoding texture");
            TextureHandle::new(device, queue, slot, spawn_decode(asset, token.clone()))
        };
        let foreground = load(TextureSlot::Foreground, foreground);
        let background = load(TextureSlot::Background, background);
        Self {
            token,
            foreground,
            background,
        }
    }

    pub fn handle(&self, slot: TextureSlot) -> &TextureHandle {
        match slot {
            TextureSlot::Foreground => &self.foreground,
            TextureSlot::Background => &self.background,
        }
    }

    /// Uploads any finished decodes; returns true when a binding changed.
    pub fn poll(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        let foreground = self.foreground.poll(device, queue);
        let background = self.background.poll(device, queue);
        foreground || background
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 160, 60, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn load_for(asset: AssetRef) -> TextureLoad {
        TextureLoad::new(TextureSlot::Foreground, spawn_decode(asset, CancelToken::new()))
    }

    fn settle(load: &mut TextureLoad, max_dimension: u32) -> TextureUpdate {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match load.poll(max_dimension) {
                TextureUpdate::Wait if Instant::now() < deadline => {
                    assert!(matches!(load.state, TextureState::Pending(_)));
                    std::thread::sleep(Duration::from_millis(5));
                }
                other => return other,
            }
        }
    }

    fn decoded(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            rgba: vec![0; (width * height * 4) as usize],
        }
    }

    #[test]
    fn pending_decode_keeps_waiting() {
        let asset = AssetRef::path("bamboo.png");
        assert!(matches!(resolve_load(&asset, LoadState::Pending, 8192), TextureUpdate::Wait));
    }

    #[test]
    fn decoded_image_within_limit_is_uploaded() {
        let asset = AssetRef::path("bamboo.png");
        match resolve_load(&asset, LoadState::Ready(decoded(4, 3)), 4) {
            TextureUpdate::Upload(image) => assert_eq!((image.width, image.height), (4, 3)),
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn oversized_image_keeps_placeholder() {
        let asset = AssetRef::path("huge.png");
        match resolve_load(&asset, LoadState::Ready(decoded(5, 2)), 4) {
            TextureUpdate::KeepPlaceholder(CompositorError::AssetLoadFailed { asset, reason }) => {
                assert_eq!(asset, "huge.png");
                assert!(reason.contains("exceeds the GPU texture limit of 4"), "{reason}");
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn failed_decode_keeps_placeholder() {
        let asset = AssetRef::path("missing.png");
        match resolve_load(&asset, LoadState::Failed("no such file".into()), 8192) {
            TextureUpdate::KeepPlaceholder(CompositorError::AssetLoadFailed { reason, .. }) => {
                assert_eq!(reason, "no such file");
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn successful_decode_becomes_ready_once() {
        let mut load = load_for(AssetRef::bytes("sprite", encode_png(3, 2)));
        assert!(matches!(load.state, TextureState::Pending(_)));
        match settle(&mut load, 8192) {
            TextureUpdate::Upload(image) => {
                assert_eq!((image.width, image.height), (3, 2));
                assert_eq!(&image.rgba[..4], &[40, 160, 60, 255]);
            }
            other => panic!("unexpected update {other:?}"),
        }
        assert!(matches!(load.state, TextureState::Ready));
        assert!(matches!(load.poll(8192), TextureUpdate::Wait));
        assert!(matches!(load.state, TextureState::Ready));
    }

    #[test]
    fn failed_decode_is_reported_once_and_stays_failed() {
        let mut load = load_for(AssetRef::bytes("junk", vec![1u8, 2, 3, 4]));
        assert!(matches!(
            settle(&mut load, 8192),
            TextureUpdate::KeepPlaceholder(CompositorError::AssetLoadFailed { .. })
        ));
        assert!(matches!(load.state, TextureState::Failed));
        for _ in 0..3 {
            assert!(matches!(load.poll(8192), TextureUpdate::Wait));
        }
        assert!(matches!(load.state, TextureState::Failed));
    }

    #[test]
    fn decode_over_device_limit_fails() {
        let mut load = load_for(AssetRef::bytes("wide", encode_png(3, 2)));
        assert!(matches!(settle(&mut load, 2), TextureUpdate::KeepPlaceholder(_)));
        assert!(matches!(load.state, TextureState::Failed));
    }
}
