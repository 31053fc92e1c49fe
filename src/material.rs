use crate::image::ImageData;
use crate::scene;
use crate::scene::{property, Material, PropertyValue, TextureId};

use std::collections::HashMap;

/// A colour with an optional texture, textures are linked only once their image has been cached
#[derive(Clone, Debug, PartialEq)]
pub struct ColourChannel {
    pub colour: [f32; 4],
    pub texture: Option<TextureId>,
}

impl Default for ColourChannel {
    fn default() -> Self {
        ColourChannel {
            colour: [0.0, 0.0, 0.0, 1.0],
            texture: None,
        }
    }
}

/// Lighting terms of a scene material ready to be bound for shading
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialCache {
    pub emissive: ColourChannel,
    pub ambient: ColourChannel,
    pub diffuse: ColourChannel,
    pub specular: ColourChannel,
    pub shininess: f32,
}

impl MaterialCache {
    /// Builds each channel from its colour property scaled by the matching factor property,
    /// `textures` holds the images already loaded for the scene
    pub fn create(material: &Material, textures: &HashMap<TextureId, ImageData>) -> Self {
        let shininess = match material.find_property(property::SHININESS).map(|p| &p.value) {
            Some(PropertyValue::Scalar(s)) => *s as f32,
            _ => 0.0,
        };
        MaterialCache {
            emissive: channel(material, property::EMISSIVE, property::EMISSIVE_FACTOR, textures),
            ambient: channel(material, property::AMBIENT, property::AMBIENT_FACTOR, textures),
            diffuse: channel(material, property::DIFFUSE, property::DIFFUSE_FACTOR, textures),
            specular: channel(material, property::SPECULAR, property::SPECULAR_FACTOR, textures),
            shininess,
        }
    }

    /// Material used for meshes which have none assigned
    pub fn default_material() -> Self {
        MaterialCache {
            diffuse: ColourChannel {
                colour: [1.0, 1.0, 1.0, 1.0],
                texture: None,
            },
            ..Default::default()
        }
    }

    /// True when the diffuse channel samples a texture
    pub fn has_texture(&self) -> bool {
        self.diffuse.texture.is_some()
    }
}

fn channel(
    material: &Material,
    colour_name: &str,
    factor_name: &str,
    textures: &HashMap<TextureId, ImageData>,
) -> ColourChannel {
    let Some(colour_property) = material.find_property(colour_name) else {
        return ColourChannel::default();
    };

    let mut rgb = match colour_property.value {
        PropertyValue::Colour(c) => c,
        PropertyValue::Scalar(s) => [s, s, s],
    };
    if let Some(scene::MaterialProperty {
        value: PropertyValue::Scalar(factor),
        ..
    }) = material.find_property(factor_name)
    {
        for c in &mut rgb {
            *c *= factor;
        }
    }

    let texture = colour_property.textures.first().copied().filter(|t| textures.contains_key(t));
    if texture.is_none() && !colour_property.textures.is_empty() {
        log::debug!(
            "dive::material: '{}' {} texture is not loaded",
            material.name,
            colour_name
        );
    }

    ColourChannel {
        colour: [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32, 1.0],
        texture,
    }
}
