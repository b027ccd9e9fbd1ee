use crate::models::api::{ ProductBrief, ProductImageRequest };

pub const COPYWRITER_SYSTEM_PROMPT: &str = "You are a marketing copywriter.";
pub const PRODUCT_COPY_MAX_TOKENS: u32 = 600;

const WEBSITE_TEMPLATE: &str =
    "Write a detailed, engaging website product description in a {tone} tone. Use paragraphs, highlight key features, and end with a call to action.";
const SOCIAL_TEMPLATE: &str =
    "Write a short, catchy Instagram post in a {tone} tone. Use emojis, line breaks, and include 3-5 relevant hashtags. Keep it under 50 words.";
const EMAIL_TEMPLATE: &str =
    "Write a medium-length email marketing copy in a {tone} tone. Start with a hook, describe the product, and end with a strong call to action. Use short paragraphs and a subject line.";

fn brief_header(brief: &ProductBrief) -> String {
    format!(
        "Product Name: {}\nCategory: {}\nKey Features: {}\nTarget Audience: {}\nPrice Point: {}\nBrand Personality/Tone: {}\n",
        brief.name,
        brief.category,
        brief.features.join(", "),
        brief.audience,
        brief.price,
        brief.personality
    )
}

/// Prompt for one output format. Unknown formats get the bare brief.
pub fn product_copy_prompt(brief: &ProductBrief, format: &str) -> String {
    let header = brief_header(brief);
    let template = match format {
        "website" => WEBSITE_TEMPLATE,
        "social" => SOCIAL_TEMPLATE,
        "email" => EMAIL_TEMPLATE,
        _ => {
            return header;
        }
    };

    format!("{}\n{}", header, template.replace("{tone}", &brief.personality.to_lowercase()))
}

fn platform_style(platform: &str) -> &'static str {
    match platform {
        "website" => "clean, professional, high-resolution product photo, white background",
        "social" => "vibrant, eye-catching, Instagram style, colorful background, trendy",
        "email" => "inviting, modern, lifestyle context, soft lighting",
        _ => "high-quality product image",
    }
}

pub fn product_image_prompt(req: &ProductImageRequest) -> String {
    format!(
        "A {} style image of a product named {}, category: {}, features: {}. {}.",
        req.personality.to_lowercase(),
        req.name,
        req.category,
        req.features.join(", "),
        platform_style(&req.platform)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief() -> ProductBrief {
        ProductBrief {
            name: "Aero Mug".into(),
            category: "Kitchen".into(),
            features: vec!["insulated".into(), "leak-proof".into()],
            audience: "commuters".into(),
            price: "$25".into(),
            personality: "Playful".into(),
            formats: vec!["social".into()],
        }
    }

    #[test]
    fn copy_prompt_includes_brief_and_lowercased_tone() {
        let prompt = product_copy_prompt(&brief(), "social");
        assert!(prompt.starts_with("Product Name: Aero Mug\nCategory: Kitchen\nKey Features: insulated, leak-proof\n"));
        assert!(prompt.contains("Instagram post in a playful tone"));
    }

    #[test]
    fn unknown_format_is_just_the_brief() {
        let prompt = product_copy_prompt(&brief(), "billboard");
        assert!(prompt.ends_with("Brand Personality/Tone: Playful\n"));
    }

    #[test]
    fn image_prompt_uses_platform_style() {
        let req = ProductImageRequest {
            name: "Aero Mug".into(),
            category: "Kitchen".into(),
            features: vec!["insulated".into()],
            personality: "Bold".into(),
            platform: "website".into(),
        };
        assert_eq!(
            product_image_prompt(&req),
            "A bold style image of a product named Aero Mug, category: Kitchen, features: insulated. clean, professional, high-resolution product photo, white background."
        );
    }
}
