//! 等距柱状投影 HDR 图像
//!
//! 纹素按 RGBA f16 存放，行序自下而上（第 0 行是图像底部），
//! 这样纹理坐标 v 增大的方向就是世界空间的 +Y。

use std::path::{Path, PathBuf};

use half::f16;
use tracing::warn;

use crate::core::error::{Result, TextureLoadError};
use crate::math::{constants, Vector3};

/// HDR 文件缺失时程序化天空的尺寸
pub const PROCEDURAL_SKY_SIZE: (u32, u32) = (1024, 512);

/// 环境贴图来源
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentSource {
    File(PathBuf),
    Procedural,
}

impl std::fmt::Display for EnvironmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentSource::File(path) => write!(f, "{}", path.display()),
            EnvironmentSource::Procedural => write!(f, "procedural sky"),
        }
    }
}

/// CPU 侧的 HDR 图像
#[derive(Debug, Clone)]
pub struct EquirectImage {
    width: u32,
    height: u32,
    texels: Vec<f16>,
}

impl EquirectImage {
    /// 由自上而下的 RGB32F 数据构建，同时翻转行序并补齐 alpha
    pub fn from_rgb32f(width: u32, height: u32, rgb: &[f32]) -> Result<Self> {
        let pixel_count = width as usize * height as usize;
        if pixel_count == 0 || rgb.len() != pixel_count * 3 {
            return Err(TextureLoadError::InvalidDimensions { width, height }.into());
        }

        let row_len = width as usize * 3;
        let mut texels = Vec::with_capacity(pixel_count * 4);
        for row in rgb.chunks_exact(row_len).rev() {
            for pixel in row.chunks_exact(3) {
                texels.extend(pixel.iter().map(|&c| f16::from_f32(c)));
                texels.push(f16::ONE);
            }
        }

        Ok(Self { width, height, texels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 读取一个纹素（行号按存储顺序，0 为底部）
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.texels[i].to_f32(),
            self.texels[i + 1].to_f32(),
            self.texels[i + 2].to_f32(),
            self.texels[i + 3].to_f32(),
        ]
    }

    /// 创建 Rgba16Float 纹理并写入数据（在下一次提交前生效）
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Equirectangular HDR"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&self.texels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 8),
                rows_per_image: Some(self.height),
            },
            size,
        );

        texture
    }
}

/// 加载 Radiance HDR 文件
pub fn load_equirect_hdr(path: &Path) -> Result<EquirectImage> {
    if !path.exists() {
        return Err(TextureLoadError::FileNotFound(path.to_path_buf()).into());
    }

    let image = image::open(path)
        .map_err(|e| TextureLoadError::DecodeError(format!("{}: {}", path.display(), e)))?
        .into_rgb32f();
    let (width, height) = image.dimensions();

    EquirectImage::from_rgb32f(width, height, image.as_raw())
}

/// 程序化天空：地平线到天顶的渐变、深色地面和一个太阳
pub fn procedural_sky(width: u32, height: u32) -> EquirectImage {
    let width = width.max(1);
    let height = height.max(1);

    let zenith = Vector3::new(0.15, 0.35, 0.85);
    let horizon = Vector3::new(0.9, 0.85, 0.75);
    let ground = Vector3::new(0.12, 0.1, 0.08);
    let sun_color = Vector3::new(1.0, 0.9, 0.75);
    let sun_dir = Vector3::new(0.4, 0.6, 0.7).normalize();

    let mut texels = Vec::with_capacity(width as usize * height as usize * 4);
    for row in 0..height {
        let v = (row as f32 + 0.5) / height as f32;
        let elevation = (v - 0.5) * constants::PI;
        for col in 0..width {
            let u = (col as f32 + 0.5) / width as f32;
            let azimuth = (u - 0.5) * constants::TAU;
            let dir = Vector3::new(
                elevation.cos() * azimuth.cos(),
                elevation.sin(),
                elevation.cos() * azimuth.sin(),
            );

            let mut color = if dir.y >= 0.0 {
                horizon.lerp(&zenith, dir.y.sqrt())
            } else {
                ground.lerp(&horizon, (1.0 + dir.y).powi(8) * 0.5)
            };
            let cos_sun = dir.dot(&sun_dir).max(0.0);
            color += sun_color * (cos_sun.powi(2048) * 50.0 + cos_sun.powi(32) * 0.5);

            texels.extend(color.iter().map(|&c| f16::from_f32(c)));
            texels.push(f16::ONE);
        }
    }

    EquirectImage { width, height, texels }
}

/// 加载 HDR 文件，失败时退回程序化天空
pub fn load_or_procedural(path: &Path) -> (EquirectImage, EnvironmentSource) {
    match load_equirect_hdr(path) {
        Ok(image) => (image, EnvironmentSource::File(path.to_path_buf())),
        Err(e) => {
            warn!("{}, falling back to a procedural sky", e);
            let (width, height) = PROCEDURAL_SKY_SIZE;
            (procedural_sky(width, height), EnvironmentSource::Procedural)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::IblRenderError;

    #[test]
    fn test_rows_are_flipped_and_alpha_added() {
        // 2x2，自上而下：第一行 1.0，第二行 0.25
        let rgb = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.25, 0.5, 0.75, 0.25, 0.5, 0.75];
        let image = EquirectImage::from_rgb32f(2, 2, &rgb).unwrap();
        assert_eq!(image.texel(0, 0), [0.25, 0.5, 0.75, 1.0]);
        assert_eq!(image.texel(1, 1), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = EquirectImage::from_rgb32f(2, 2, &[0.0; 9]).unwrap_err();
        assert!(matches!(
            err,
            IblRenderError::Texture(TextureLoadError::InvalidDimensions { width: 2, height: 2 })
        ));
        assert!(EquirectImage::from_rgb32f(0, 4, &[]).is_err());
    }

    #[test]
    fn test_procedural_sky_layout() {
        let sky = procedural_sky(64, 32);
        assert_eq!((sky.width(), sky.height()), (64, 32));

        let mut brightest = 0.0f32;
        for y in 0..32 {
            for x in 0..64 {
                let [r, g, b, a] = sky.texel(x, y);
                assert!(r.is_finite() && g.is_finite() && b.is_finite());
                assert!(r >= 0.0 && g >= 0.0 && b >= 0.0);
                assert_eq!(a, 1.0);
                brightest = brightest.max(r);
            }
        }
        assert!(brightest > 1.0, "sun should be an HDR hot spot");

        // 顶部是蓝天，底部是地面
        let top = sky.texel(0, 31);
        let bottom = sky.texel(0, 0);
        assert!(top[2] > top[0]);
        assert!(top[2] > bottom[2]);
    }

    #[test]
    fn test_missing_file() {
        let err = load_equirect_hdr(Path::new("does/not/exist.hdr")).unwrap_err();
        assert!(matches!(err, IblRenderError::Texture(TextureLoadError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let (image, source) = load_or_procedural(Path::new("does/not/exist.hdr"));
        assert_eq!(source, EnvironmentSource::Procedural);
        assert_eq!((image.width(), image.height()), PROCEDURAL_SKY_SIZE);
    }

    #[test]
    fn test_load_radiance_file() {
        use image::codecs::hdr::HdrEncoder;
        use image::Rgb;

        let path = std::env::temp_dir().join(format!("ibl_render_hdr_{}.hdr", std::process::id()));
        let pixels = [Rgb([2.0f32, 2.0, 2.0]), Rgb([0.5, 0.5, 0.5])];
        {
            let file = std::fs::File::create(&path).unwrap();
            HdrEncoder::new(std::io::BufWriter::new(file))
                .encode(&pixels, 1, 2)
                .unwrap();
        }

        let image = load_equirect_hdr(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((image.width(), image.height()), (1, 2));
        // 文件第一行（顶部）最终位于存储的最后一行
        assert!((image.texel(0, 1)[0] - 2.0).abs() < 0.05);
        assert!((image.texel(0, 0)[0] - 0.5).abs() < 0.05);
    }
}
