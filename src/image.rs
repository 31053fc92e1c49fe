use stb_image_rust;
use stb_image_write_rust::ImageWriter::ImageWriter;

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::Error;
use crate::ErrorKind;

/// Minimal header to describe image data, rgba8 tightly packed
#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Vector of linear image data tightly packed, 4 components per pixel
    pub data: Vec<u8>,
}

/// True if the file extension is one this module can decode
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tga"))
        .unwrap_or(false)
}

/// Loads an image from file returning information in the ImageData struct
/// supported formats are (tga)
pub fn load_from_file(path: &Path) -> Result<ImageData, Error> {
    if !is_supported(path) {
        return Err(Error::new(
            ErrorKind::Unsupported,
            format!("dive::image: unsupported image format: {}", path.display()),
        ));
    }

    log::debug!("dive::image: loading: {}", path.display());
    let mut f = fs::File::open(path)?;
    let mut contents = vec![];
    f.read_to_end(&mut contents)?;

    let mut x = 0;
    let mut y = 0;
    let mut comp = 0;
    let mut data_out: Vec<u8> = Vec::new();

    unsafe {
        // load image
        let img = stb_image_rust::stbi_load_from_memory(
            contents.as_mut_ptr(),
            contents.len() as i32,
            &mut x,
            &mut y,
            &mut comp,
            stb_image_rust::STBI_rgb_alpha,
        );

        if !img.is_null() {
            // copy data
            let data_size_bytes = x * y * 4;
            data_out.resize(data_size_bytes as usize, 0);
            std::ptr::copy_nonoverlapping(img, data_out.as_mut_ptr(), data_size_bytes as usize);

            // cleanup
            stb_image_rust::c_runtime::free(img);

            Ok(ImageData {
                width: x as u32,
                height: y as u32,
                data: data_out,
            })
        }
        else {
            Err(Error::asset(format!(
                "dive::image: failed to load image via stb_image: {}",
                path.display()
            )))
        }
    }
}

/// Writes a buffer of image data to a tga file
pub fn write_to_file(path: &Path, width: u32, height: u32, components: u32, image_data: &[u8]) -> Result<(), Error> {
    if !is_supported(path) {
        return Err(Error::new(
            ErrorKind::Unsupported,
            format!("dive::image: unsupported image format: {}", path.display()),
        ));
    }
    if image_data.len() < (width * height * components) as usize {
        return Err(Error::asset("dive::image: image data is smaller than width * height * components"));
    }
    let filename = path
        .to_str()
        .ok_or_else(|| Error::new(ErrorKind::Io, format!("dive::image: non utf-8 path: {}", path.display())))?;
    let mut writer = ImageWriter::new(filename);
    writer.write_tga(width as i32, height as i32, components as i32, image_data.as_ptr());
    Ok(())
}
