//! GLSL ES 1.00 sources for the overlay program.

use crate::light::DiffuseLight;

pub const U_MODE: &str = "uMode";
pub const U_MVP: &str = "uMVP";
pub const U_TEXTURE: &str = "uTexture";
pub const A_POSITION: &str = "aPosition";
pub const A_TEX_POSITION: &str = "aTexPosition";
pub const A_NORMAL: &str = "aNormal";

/// Shader path selected through the `uMode` uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RenderMode {
    /// Position passes through untransformed; fragment samples the texture.
    Passthrough = 1,
    /// MVP-transformed, solid red.
    DebugSolid = 2,
    /// MVP-transformed, ambient + diffuse shading.
    LitDiffuse = 3,
}

impl RenderMode {
    pub fn as_uniform(self) -> i32 {
        self as i32
    }
}

// `uMode` is declared in both stages and must carry the same precision in
// each. Vertex ints default to highp, fragment ints to mediump.
pub const VERTEX_SHADER: &str = r#"
precision mediump int;

uniform int uMode;
uniform mat4 uMVP;

attribute vec4 aPosition;
attribute vec2 aTexPosition;
attribute vec3 aNormal;

varying vec2 vTexPosition;
varying vec3 vNormal;

void main() {
    vTexPosition = aTexPosition;
    vNormal = vec3(0.0);
    if (uMode == 1) {
        gl_Position = aPosition;
    } else if (uMode == 2) {
        gl_Position = uMVP * aPosition;
    } else {
        gl_Position = uMVP * aPosition;
        vNormal = aNormal;
    }
}
"#;

/// Fragment stage with the given light baked in as constants.
pub fn fragment_shader(light: &DiffuseLight) -> String {
    format!(
        r#"
precision mediump float;
precision mediump int;

uniform int uMode;
uniform sampler2D uTexture;

varying vec2 vTexPosition;
varying vec3 vNormal;

void main() {{
    if (uMode == 1) {{
        gl_FragColor = texture2D(uTexture, vTexPosition);
    }} else if (uMode == 2) {{
        gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0);
    }} else {{
{constants}
        vec3 ambient = ambientStrength * lightColor;
        float diff = max(dot(vNormal, lightDir), 0.0);
        vec3 diffuse = diff * lightColor * diffuseStrength;
        gl_FragColor = vec4((ambient + diffuse) * objectColor, 1.0);
    }}
}}
"#,
        constants = light.glsl_declarations()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_values_match_shader_branches() {
        assert_eq!(RenderMode::Passthrough.as_uniform(), 1);
        assert_eq!(RenderMode::DebugSolid.as_uniform(), 2);
        assert_eq!(RenderMode::LitDiffuse.as_uniform(), 3);
    }

    #[test]
    fn sources_declare_interface_names() {
        let fragment = fragment_shader(&DiffuseLight::default());
        for name in [U_MODE, U_MVP, A_POSITION, A_TEX_POSITION, A_NORMAL] {
            assert!(VERTEX_SHADER.contains(name), "vertex stage lacks {name}");
        }
        assert!(fragment.contains(U_TEXTURE));
        assert!(fragment.contains(U_MODE));
    }

    #[test]
    fn fragment_bakes_reference_light() {
        let fragment = fragment_shader(&DiffuseLight::default());
        assert!(fragment.contains("normalize(vec3(3.0, 2.0, -60.0))"));
        assert!(fragment.contains("vec3(0.8, 0.2, 0.6)"));
        assert!(!fragment.contains("{constants}"));
    }

    fn default_precision<'a>(source: &'a str, kind: &str) -> Option<&'a str> {
        source.lines().map(str::trim).find_map(|line| {
            line.strip_prefix("precision ")?
                .strip_suffix(';')?
                .strip_suffix(kind)
                .map(str::trim)
        })
    }

    #[test]
    fn stages_agree_on_shared_uniform_precision() {
        let fragment = fragment_shader(&DiffuseLight::default());
        let vertex = default_precision(VERTEX_SHADER, "int");
        assert!(vertex.is_some(), "vertex stage has no int precision");
        assert_eq!(vertex, default_precision(&fragment, "int"));
        assert!(VERTEX_SHADER.contains("uniform int uMode;"));
        assert!(fragment.contains("uniform int uMode;"));
    }
}
