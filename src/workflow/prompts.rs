//! Prompt builders for the writer and reviewer roles.
//!
//! All builders are pure functions of the profile, the document and the
//! run settings.

use super::profiles::DocumentProfile;
use super::roles::{Role, RoleId};
use super::settings::AgentSettings;

/// System instruction sent with every generation call.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert technical documentation assistant. Follow instructions precisely. Output only Markdown and do not surround it with code fences.";

/// Global writing and Markdown style guides, empty when neither is set.
fn global_style_guidance(settings: &AgentSettings) -> String {
    let mut guidance = String::new();

    if !settings.writing_style_guide.trim().is_empty() {
        guidance.push_str(&format!(
            "\nGlobal writing style guide to adhere to:\n<global_writing_style_guide>\n{}\n</global_writing_style_guide>",
            settings.writing_style_guide
        ));
    }
    if !settings.markdown_style_guide.trim().is_empty() {
        guidance.push_str(&format!(
            "\nGlobal Markdown style guide to adhere to:\n<global_markdown_style_guide>\n{}\n</global_markdown_style_guide>",
            settings.markdown_style_guide
        ));
    }

    guidance
}

fn profile_header(profile: &DocumentProfile) -> String {
    let mut header = format!(
        "Document Profile:\n\n  Name: {}\n\n  Description: {}\n\n",
        profile.name, profile.description
    );

    if !profile.doc_type_description.trim().is_empty() {
        header.push_str(&format!(
            "Guidance on writing for this document type:\n<doc_type_guidance>\n{}\n</doc_type_guidance>\n",
            profile.doc_type_description
        ));
    }

    header
}

/// Prompt for the writer's first draft.
pub fn initial_draft_prompt(
    profile: &DocumentProfile,
    source_content: &str,
    supporting_content: &str,
    settings: &AgentSettings,
) -> String {
    let template = if profile.template.trim().is_empty() {
        "No specific template provided, generate a standard structure for this document type."
            .to_string()
    } else {
        format!(
            "Template to adhere to while writing or revising this document:\n\n```markdown\n{}\n```",
            profile.template
        )
    };

    let supporting = if supporting_content.trim().is_empty() {
        "No supporting content provided."
    } else {
        supporting_content
    };

    format!(
        r#"You are an expert {writer}.

Your task is to create a draft of a new technical document.
{style}
{header}
{template}

Existing document, draft, or other content serving as the source material for the document:

```
{source}
```

Authoritative source code or other content serving as the source of truth against which the document's claims and content should be compared:

```
{supporting}
```

Based on all the provided information, write a comprehensive, clear, and well-structured document titled appropriately for its content, fitting the profile of a "{name}". Ensure the output is in Markdown format and NOT enclosed in triple-backtick code fencing.

Focus on fulfilling the purpose of a {name} as described.

Output ONLY the Markdown content for the document. Do not include any preambles or explanations outside the Markdown and do NOT enclose the document in code fences."#,
        writer = RoleId::TechnicalWriter.name(),
        style = global_style_guidance(settings),
        header = profile_header(profile),
        source = source_content,
        name = profile.name,
    )
}

/// Prompt asking the writer to apply one reviewer's feedback.
pub fn revision_prompt(
    profile: &DocumentProfile,
    document: &str,
    feedback: &str,
    settings: &AgentSettings,
) -> String {
    format!(
        r#"You are an expert {writer}. Your task is to revise an existing technical document based on specific feedback.
{style}
{header}
Document to revise:

```markdown
{document}
```

Feedback for revision:

```
{feedback}
```

Carefully consider the feedback and apply the necessary changes to the document. Ensure the revised output is in Markdown format.

Output ONLY the revised Markdown content for the document. Do not include any preambles or explanations outside the Markdown. Do NOT enclose the document itself in code fencing."#,
        writer = RoleId::TechnicalWriter.name(),
        style = global_style_guidance(settings),
        header = profile_header(profile),
    )
}

/// Prompt for one reviewer pass.
///
/// The role's [`ReviewFocus`](super::roles::ReviewFocus) decides whether the
/// source and supporting content or the style guidance is attached. Returns `None` for
/// roles that do not review.
pub fn review_prompt(
    role: &Role,
    profile: &DocumentProfile,
    document: &str,
    source_content: &str,
    supporting_content: &str,
    settings: &AgentSettings,
) -> Option<String> {
    let focus = role.focus?;
    let mut preamble = format!(
        "You are an expert {}. Your specialization is: {}.",
        role.id.name(),
        focus.specialization
    );

    if focus.include_style_guidance {
        preamble.push_str(&global_style_guidance(settings));
        if !profile.doc_type_description.trim().is_empty() {
            preamble.push_str(&format!(
                "\n\nGuidance on writing for the document type \"{}\":\n<doc_type_guidance>\n{}\n</doc_type_guidance>",
                profile.name, profile.doc_type_description
            ));
        }
    }

    if let Some(guidance) = settings.guidance_for(role.id) {
        preamble.push_str(&format!(
            "\n\nSpecific review guidance for this task (in addition to your primary specialization):\n\n```\n{}\n```",
            guidance
        ));
    }

    let mut cross_reference = String::new();
    if focus.cross_reference_sources {
        if !source_content.trim().is_empty() {
            cross_reference.push_str(&format!(
                "\n\nOriginal source for cross-referencing:\n\n```\n{}\n```",
                source_content
            ));
        }
        if !supporting_content.trim().is_empty() {
            cross_reference.push_str(&format!(
                "\n\nAuthoritative supporting content (source of truth) for cross-referencing:\n\n```\n{}\n```",
                supporting_content
            ));
        }
    }

    Some(format!(
        r#"{preamble}

You are reviewing a technical document of type '{name}'.

Document content to review:

```markdown
{document}
```
{cross_reference}

CRITICAL INSTRUCTION: You MUST respond in one of the following two formats ONLY:

1. If the document meets all quality standards for your area of expertise and the provided guidance, and requires NO changes:

    CONTINUE

2. If the document requires revisions in your area of expertise or based on the provided guidance:

    REVISE: [Provide very specific, actionable feedback. Clearly state what needs to be changed and why, focusing ONLY on your area of specialization: {specialization} and the custom guidance provided.]

Do not add any text other than specified."#,
        name = profile.name,
        specialization = focus.specialization,
    ))
}
