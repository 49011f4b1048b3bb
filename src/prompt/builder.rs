use super::engine::TeraEngine;
use crate::config::GenerationConfig;
use crate::corpus::Snippet;
use tera::Context;

const OUTLINE_TEMPLATE: &str = "\
Produce an outline for a long-form piece about: {{ topic }}

Respond with a single JSON object and nothing else:
{\"title\": string, \"thesis\": string, \"classification\": string, \
\"audience\": string, \"sections\": [{\"title\": string, \"description\": string, \
\"subsections\": [{\"title\": string, \"description\": string}] (optional)}]}

Use between {{ min_sections }} and {{ max_sections }} sections.
{% if audience %}The intended audience is: {{ audience }}.
{% endif %}\
{% if feedback %}
Your previous attempt was rejected. Correct these problems:
{% for item in feedback %}- {{ item }}
{% endfor %}{% endif %}";

const SECTION_TEMPLATE: &str = "\
Write the section \"{{ section_title }}\" of a draft titled \"{{ draft_title }}\".
Thesis: {{ thesis }}
Section brief: {{ section_description }}

Ground every claim in these source excerpts; do not invent facts:
{% for snippet in snippets %}[{{ snippet.source }}] {{ snippet.text }}
{% endfor %}
Write between {{ min_words }} and {{ max_words }} words of plain prose.
{% if audience %}Audience: {{ audience }}.
{% endif %}\
{% if required_terms %}Keep using this terminology: {{ required_terms | join(sep=\", \") }}.
{% endif %}\
{% if prior_sections %}Earlier sections already cover:
{% for prior in prior_sections %}- {{ prior }}
{% endfor %}{% endif %}\
{% if feedback %}
Your previous attempt was rejected. Correct these problems:
{% for item in feedback %}- {{ item }}
{% endfor %}{% endif %}";

const OUTLINE_NAME: &str = "outline";
const SECTION_NAME: &str = "section";

/// Ensure the default templates are registered in the engine.
fn ensure_defaults(engine: &mut TeraEngine) -> anyhow::Result<()> {
    // `add_template` overwrites silently, so we always register.
    engine.add_template(OUTLINE_NAME, OUTLINE_TEMPLATE)?;
    engine.add_template(SECTION_NAME, SECTION_TEMPLATE)?;
    Ok(())
}

/// Build the outline prompt. `feedback` carries rejection reasons from a
/// previous attempt so the backend can self-correct.
pub fn build_outline_prompt(
    engine: &mut TeraEngine,
    topic: &str,
    generation: &GenerationConfig,
    feedback: &[String],
) -> anyhow::Result<String> {
    ensure_defaults(engine)?;

    let mut ctx = Context::new();
    ctx.insert("topic", topic);
    ctx.insert("min_sections", &generation.min_sections);
    ctx.insert("max_sections", &generation.max_sections);
    ctx.insert("audience", &generation.audience.as_deref().unwrap_or_default());
    ctx.insert("feedback", feedback);

    engine.render(OUTLINE_NAME, &ctx)
}

/// Build a section prompt from the accepted outline, retrieved snippets,
/// and generation constraints.
#[allow(clippy::too_many_arguments)]
pub fn build_section_prompt(
    engine: &mut TeraEngine,
    draft_title: &str,
    thesis: &str,
    section_title: &str,
    section_description: &str,
    snippets: &[Snippet],
    generation: &GenerationConfig,
    prior_sections: &[String],
    feedback: &[String],
) -> anyhow::Result<String> {
    ensure_defaults(engine)?;

    let mut ctx = Context::new();
    ctx.insert("draft_title", draft_title);
    ctx.insert("thesis", thesis);
    ctx.insert("section_title", section_title);
    ctx.insert("section_description", section_description);
    ctx.insert("snippets", snippets);
    ctx.insert("min_words", &generation.min_words);
    ctx.insert("max_words", &generation.max_words);
    ctx.insert("audience", &generation.audience.as_deref().unwrap_or_default());
    ctx.insert("required_terms", &generation.required_terms);
    ctx.insert("prior_sections", prior_sections);
    ctx.insert("feedback", feedback);

    engine.render(SECTION_NAME, &ctx)
}
