use brandforge_core::providers::RepairFlags;
use brandforge_critique::types::VariationResult;

/// Map the critique's complaint text onto concrete local repairs. Scans
/// every scorecard's feedback and issues; an Enhance decision whose
/// derived flags are empty is demoted by the workflow engine.
pub fn derive_repair_flags(variation: &VariationResult) -> RepairFlags {
    let mut flags = RepairFlags::default();

    for card in &variation.scorecards {
        let mut text = card.feedback.to_lowercase();
        for issue in &card.issues {
            text.push(' ');
            text.push_str(&issue.to_lowercase());
        }

        if ["blur", "blurry", "unsharp", "soft"].iter().any(|kw| text.contains(kw)) {
            flags.sharpen = true;
        }
        if ["noise", "noisy", "artifact", "grain"].iter().any(|kw| text.contains(kw)) {
            flags.denoise = true;
        }
        if ["contrast", "flat", "dull"].iter().any(|kw| text.contains(kw)) {
            flags.contrast = true;
        }
        if ["bright", "dark", "brightness", "exposure"].iter().any(|kw| text.contains(kw)) {
            flags.brightness = true;
        }
    }

    flags
}
