//! Fixed prompt templates for the three generation stages

/// Instruction sent alongside the uploaded photo
pub const DESCRIBE_INSTRUCTION: &str = "Describe the person in this image in detail, focusing on features that would be useful for creating a cartoon avatar or memoji. Describe their hair style and color, eye shape and color, face shape, glasses, facial hair, and expression. Be concise and descriptive.";

pub fn avatar_image_prompt(description: &str) -> String {
    format!(
        "A 3D memoji style avatar of a person with {description}. Pixar style, character portrait, colorful, clean details, centered, on a solid light gray background."
    )
}

pub fn bio_prompt(description: &str) -> String {
    format!(
        "Based on this description of a person: \"{description}\", write a short, fun, and quirky one-paragraph bio for their memoji avatar. Make it sound like a character introduction in a fun animated movie."
    )
}
