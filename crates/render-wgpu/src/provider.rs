use std::future::Future;

use densim_render::{BackendProvider, InitError, SceneLayout};

use crate::gpu::WgpuBackend;

/// Acquires an adapter and device for a window surface.
///
/// `width` and `height` are the surface size in physical pixels; the canvas
/// size in the layout only sizes the density texture.
pub struct WgpuProvider<T> {
    target: T,
    width: u32,
    height: u32,
}

impl<T> WgpuProvider<T>
where
    T: Into<wgpu::SurfaceTarget<'static>>,
{
    pub fn new(target: T, width: u32, height: u32) -> Self {
        Self { target, width, height }
    }
}

impl<T> BackendProvider for WgpuProvider<T>
where
    T: Into<wgpu::SurfaceTarget<'static>>,
{
    type Backend = WgpuBackend;

    fn acquire(self, layout: &SceneLayout) -> impl Future<Output = Result<WgpuBackend, InitError>> {
        async move {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let surface = instance
                .create_surface(self.target)
                .map_err(|e| InitError::Surface(e.to_string()))?;

            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .ok_or(InitError::NoAdapter)?;
            tracing::info!(adapter = ?adapter.get_info().name, "adapter acquired");

            let (device, queue) = adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("densim_device"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::default(),
                        memory_hints: Default::default(),
                    },
                    None,
                )
                .await
                .map_err(|e| InitError::RequestDevice(e.to_string()))?;

            let caps = surface.get_capabilities(&adapter);
            // scene colors are written as-is, without sRGB encoding
            let format = caps
                .formats
                .iter()
                .find(|f| !f.is_srgb())
                .or_else(|| caps.formats.first())
                .copied()
                .ok_or_else(|| InitError::Surface("surface reports no formats".to_string()))?;
            // density colors carry alpha 0, so fragments must not be composited by alpha
            let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
                wgpu::CompositeAlphaMode::Opaque
            } else {
                wgpu::CompositeAlphaMode::Auto
            };

            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: self.width.max(1),
                height: self.height.max(1),
                present_mode: wgpu::PresentMode::AutoVsync,
                alpha_mode,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            };

            WgpuBackend::new(device, queue, surface, config, layout)
        }
    }
}
