//! Lighting model for the overlay pass.

use std::fmt::Write as _;

use crate::math::vec3::Vec3;

/// A fixed directional light shading a single-coloured object with
/// ambient + diffuse (Lambert) terms.
///
/// The values are compiled into the fragment shader; [`reflectance`]
/// computes the same colour on the CPU.
///
/// [`reflectance`]: DiffuseLight::reflectance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffuseLight {
    /// Direction toward the light. Normalized on use.
    pub toward_light: Vec3,
    pub light_color: Vec3,
    pub object_color: Vec3,
    pub ambient_strength: f32,
    /// Multiplier for the diffuse lighting contribution (default: 1.0)
    pub diffuse_strength: f32,
}

impl Default for DiffuseLight {
    fn default() -> Self {
        Self {
            toward_light: Vec3::new(3.0, 2.0, -60.0),
            light_color: Vec3::ONE,
            object_color: Vec3::new(0.8, 0.2, 0.6),
            ambient_strength: 0.3,
            diffuse_strength: 1.0,
        }
    }
}

impl DiffuseLight {
    /// RGB reflected by a surface with the given normal.
    ///
    /// The normal is used as given; like the shader, no normal matrix is
    /// applied.
    pub fn reflectance(&self, normal: Vec3) -> Vec3 {
        let ambient = self.light_color * self.ambient_strength;
        let diff = normal.dot(self.toward_light.normalize()).max(0.0);
        let diffuse = self.light_color * (diff * self.diffuse_strength);
        (ambient + diffuse).hadamard(self.object_color)
    }

    /// GLSL declarations for the lighting constants.
    pub(crate) fn glsl_declarations(&self) -> String {
        let mut out = String::new();
        let vec3 = |v: Vec3| format!("vec3({:?}, {:?}, {:?})", v.x, v.y, v.z);
        // Writing to a String cannot fail.
        let _ = writeln!(out, "vec3 lightDir = normalize({});", vec3(self.toward_light));
        let _ = writeln!(out, "const vec3 lightColor = {};", vec3(self.light_color));
        let _ = writeln!(out, "const vec3 objectColor = {};", vec3(self.object_color));
        let _ = writeln!(out, "const float ambientStrength = {:?};", self.ambient_strength);
        let _ = writeln!(out, "const float diffuseStrength = {:?};", self.diffuse_strength);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn facing_away_gets_ambient_only() {
        let light = DiffuseLight::default();
        let color = light.reflectance(-light.toward_light.normalize());
        assert_relative_eq!(color.x, 0.3 * 0.8, epsilon = 1e-6);
        assert_relative_eq!(color.y, 0.3 * 0.2, epsilon = 1e-6);
        assert_relative_eq!(color.z, 0.3 * 0.6, epsilon = 1e-6);
    }

    #[test]
    fn facing_light_gets_full_diffuse() {
        let light = DiffuseLight::default();
        let color = light.reflectance(light.toward_light.normalize());
        assert_relative_eq!(color.x, 1.3 * 0.8, epsilon = 1e-5);
        assert_relative_eq!(color.y, 1.3 * 0.2, epsilon = 1e-5);
        assert_relative_eq!(color.z, 1.3 * 0.6, epsilon = 1e-5);
    }

    #[test]
    fn angled_normal_scales_diffuse() {
        let light = DiffuseLight {
            toward_light: Vec3::new(0.0, 1.0, 0.0),
            object_color: Vec3::ONE,
            ambient_strength: 0.0,
            ..DiffuseLight::default()
        };
        // cos(45) ≈ 0.707
        let color = light.reflectance(Vec3::new(0.0, 1.0, 1.0).normalize());
        assert_relative_eq!(color.x, 0.7071, epsilon = 1e-3);
    }

    #[test]
    fn declarations_use_float_literals() {
        let glsl = DiffuseLight::default().glsl_declarations();
        assert!(glsl.contains("normalize(vec3(3.0, 2.0, -60.0))"));
        assert!(glsl.contains("const vec3 objectColor = vec3(0.8, 0.2, 0.6);"));
        assert!(glsl.contains("const float ambientStrength = 0.3;"));
    }
}
