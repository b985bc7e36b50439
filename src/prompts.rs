//! Prompt templates for the forecasters and the research steps.
//!
//! Each forecasting prompt ends with an explicit answer format. The extractors depend
//! on that format, so changes here must keep the final-answer block intact.

use crate::question::Question;

pub fn binary_prompt(question: &Question, research: &str, today: &str) -> String {
    format!(
        r#"
You are a professional forecaster interviewing for a job.

Your interview question is:
{title}

Question background:
{background}


This question's outcome will be determined by the specific criteria below. These criteria have not yet been satisfied:
{criteria}

{fine_print}


Your research assistant says:
{research}

Today is {today}.

Before answering you write:
(a) The time left until the outcome to the question is known.
(b) The status quo outcome if nothing changed.
(c) A brief description of a scenario that results in a No outcome.
(d) A brief description of a scenario that results in a Yes outcome.

You write your rationale remembering that good forecasters put extra weight on the status quo outcome since the world changes slowly most of the time.

The last thing you write is your final answer as: "Probability: ZZ%", 0-100
"#,
        title = question.title,
        background = question.description,
        criteria = question.resolution_criteria,
        fine_print = question.fine_print,
    )
}

pub fn multiple_choice_prompt(question: &Question, research: &str, today: &str) -> String {
    let options = format!("{:?}", question.options);
    format!(
        r#"
You are a professional forecaster interviewing for a job.

Your interview question is:
{title}

The options are: {options}


Background:
{background}

{criteria}

{fine_print}


Your research assistant says:
{research}

Today is {today}.

Before answering you write:
(a) The time left until the outcome to the question is known.
(b) The status quo outcome if nothing changed.
(c) A description of a scenario that results in an unexpected outcome.

You write your rationale remembering that (1) good forecasters put extra weight on the status quo outcome since the world changes slowly most of the time, and (2) good forecasters leave some moderate probability on most options to account for unexpected outcomes.

The last thing you write is your final probabilities for the N options in this order {options} as:
Option_A: Probability_A
Option_B: Probability_B
...
Option_N: Probability_N
"#,
        title = question.title,
        background = question.description,
        criteria = question.resolution_criteria,
        fine_print = question.fine_print,
    )
}

pub fn numeric_prompt(question: &Question, research: &str, today: &str) -> String {
    let (lower_message, upper_message) = bound_messages(question);
    format!(
        r#"
You are a professional forecaster interviewing for a job.

Your interview question is:
{title}

Background:
{background}

{criteria}

{fine_print}

Units for answer: {units}

Your research assistant says:
{research}

Today is {today}.

{lower_message}
{upper_message}


Formatting Instructions:
- Please notice the units requested (e.g. whether you represent a number as 1,000,000 or 1m).
- Never use scientific notation.
- Always start with a smaller number (more negative if negative) and then increase from there

Before answering you write:
(a) The time left until the outcome to the question is known.
(b) The outcome if nothing changed.
(c) The outcome if the current trend continued.
(d) The expectations of experts and markets.
(e) A brief description of an unexpected scenario that results in a low outcome.
(f) A brief description of an unexpected scenario that results in a high outcome.

You remind yourself that good forecasters are humble and set wide 90/10 confidence intervals to account for unknown unknowns.

The last thing you write is your final answer as:
"
Percentile 10: XX
Percentile 20: XX
Percentile 40: XX
Percentile 60: XX
Percentile 80: XX
Percentile 90: XX
"
"#,
        title = question.title,
        background = question.description,
        criteria = question.resolution_criteria,
        fine_print = question.fine_print,
        units = question.unit_of_measure(),
    )
}

/// Closed bounds are stated to the model; open bounds are left unsaid.
fn bound_messages(question: &Question) -> (String, String) {
    let scaling = question.scaling.clone().unwrap_or_default();
    let lower = match scaling.range_min {
        Some(min) if !question.open_lower_bound => {
            format!("The outcome can not be lower than {min}.")
        }
        _ => String::new(),
    };
    let upper = match scaling.range_max {
        Some(max) if !question.open_upper_bound => {
            format!("The outcome can not be higher than {max}.")
        }
        _ => String::new(),
    };
    (lower, upper)
}

pub fn classify_question_prompt(question: &str, field: &str) -> String {
    format!(
        r#"
You are analyzing a forecasting question to identify its primary field or domain.

Question: {question}

Field context (if provided): {field}

Classify this question into a specific field or domain (e.g., politics, economics, technology, international relations, public health, sports, entertainment, science).
If a field context is already provided, validate it and give a more specific sub-field if applicable.

Return your response in the following format:
Field: [Primary field]
Sub-field: [More specific categorization if applicable]
Reasoning: [Brief explanation]
"#
    )
}

pub fn search_entities_prompt(question: &str, field: &str) -> String {
    format!(
        r#"
You are identifying key entities relevant to a forecasting question.

Question: {question}

Field: {field}

Identify the most important entities involved: countries or regions, political leaders or officials, organizations, companies, international bodies or agreements, and key individuals.

Return your response in the following format:
Entities:
- [Entity]

Countries/Regions:
- [Country/Region]

Reasoning: [Why these entities are relevant]
"#
    )
}

pub fn analyze_entities_prompt(question: &str, entities: &str) -> String {
    format!(
        r#"
You are analyzing the characteristics and relationships of key entities relevant to a forecasting question.

Question: {question}

Entities and countries identified: {entities}

For each major entity analyze its character or institutional approach, its typical approach to similar situations, its relationships with the other entities, its current motivations and incentives, and its historical patterns of behavior.

Return your analysis in a structured format with one section per entity.
"#
    )
}

pub fn search_news_prompt(question: &str, field: &str, entities: &str) -> String {
    format!(
        r#"
You are summarizing the most relevant recent news for a forecasting question.

Question: {question}

Field: {field}

Entities: {entities}

Summarize 10-20 of the most relevant, recent, high-quality news articles about the question, the entities involved, related developments, and expert opinions. Prefer recent, authoritative, quantitative sources that bear on the resolution criteria.

Return your response in the following format:
News Summary:
1. [Headline] - [Date] - [Source]
   Summary: [2-3 sentences]
   Relevance: [How this relates to the question]

Key Trends Identified:
- [Trend]
"#
    )
}

pub fn final_report_prompt(
    question: &str,
    field_classification: &str,
    entity_analysis: &str,
    news_summary: &str,
) -> String {
    format!(
        r#"
You are generating a research report for a superforecaster.

Question: {question}

Field Classification:
{field_classification}

Entity Analysis:
{entity_analysis}

Recent News:
{news_summary}

Write a concise but comprehensive report that summarizes the current state of affairs, the most relevant entities and their likely behavior, key trends, important dates and deadlines, expert and market expectations, and open uncertainties.
Present information only. Do not make predictions yourself.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_question(open_lower: bool, open_upper: bool) -> Question {
        let json = format!(
            r#"{{"title": "GDP?", "type": "numeric", "unit": "USD bn",
                "open_lower_bound": {open_lower}, "open_upper_bound": {open_upper},
                "scaling": {{"range_min": 0, "range_max": 500}}}}"#
        );
        Question::from_json(&json).unwrap()
    }

    #[test]
    fn numeric_prompt_states_closed_bounds_only() {
        let prompt = numeric_prompt(&numeric_question(false, true), "report", "2026-01-01");
        assert!(prompt.contains("The outcome can not be lower than 0."));
        assert!(!prompt.contains("can not be higher"));
        assert!(prompt.contains("Units for answer: USD bn"));
        assert!(prompt.contains("Percentile 90: XX"));
    }

    #[test]
    fn binary_prompt_ends_with_answer_format() {
        let q = Question::from_json(r#"{"title": "Will it rain?", "type": "binary"}"#).unwrap();
        let prompt = binary_prompt(&q, "dry season", "2026-01-01");
        assert!(prompt.contains("Will it rain?"));
        assert!(prompt.trim_end().ends_with("\"Probability: ZZ%\", 0-100"));
    }
}
