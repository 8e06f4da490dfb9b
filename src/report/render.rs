//! Designer report rendering.
//!
//! Produces the subject plus plain-text and HTML bodies for one client
//! profile. All profile text is escaped before it goes into HTML.

use std::fmt;

use convert_case::{Case, Casing};
use serde::Serialize;
use uuid::Uuid;

use crate::profile::ClientProfile;

const NOT_SPECIFIED: &str = "Not specified";

/// A rendered report ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub report_id: Uuid,
    pub recipient: String,
    pub client_name: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the designer report for a profile.
pub fn render_report(profile: &ClientProfile, recipient: &str) -> ProfileReport {
    ProfileReport {
        report_id: Uuid::new_v4(),
        recipient: recipient.to_string(),
        client_name: profile.client_name.clone(),
        subject: format!("New Client Profile: {}", profile.client_name),
        text: TextReport(profile).to_string(),
        html: HtmlReport(profile).to_string(),
    }
}

fn or_unspecified(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(NOT_SPECIFIED)
}

fn text_or_unspecified(value: &str) -> &str {
    or_unspecified(Some(value))
}

fn generated_date(profile: &ClientProfile) -> String {
    profile.generated_at.format("%B %d, %Y at %I:%M %p UTC").to_string()
}

/// Plain-text body.
struct TextReport<'a>(&'a ClientProfile);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.0;

        writeln!(out, "CLIENT PROFILE: {}", profile.client_name)?;
        writeln!(out, "Generated: {}\n", generated_date(profile))?;

        writeln!(out, "CONTACT")?;
        writeln!(out, "Email: {}", text_or_unspecified(&profile.email))?;
        writeln!(out, "Phone: {}", text_or_unspecified(&profile.phone))?;
        writeln!(out, "Timeline: {}\n", text_or_unspecified(&profile.timeline))?;

        writeln!(out, "PROJECT OVERVIEW")?;
        writeln!(out, "Type: {}", text_or_unspecified(&profile.project_type))?;
        writeln!(out, "Summary: {}", text_or_unspecified(&profile.project_summary))?;
        writeln!(out, "Address: {}", or_unspecified(profile.property_address.as_deref()))?;
        writeln!(out, "Budget: {}", or_unspecified(profile.budget_range.as_deref()))?;
        writeln!(out, "Style: {}\n", or_unspecified(profile.style_preference.as_deref()))?;

        if !profile.answers.is_empty() {
            writeln!(out, "QUESTIONNAIRE")?;
            for (key, answer) in &profile.answers {
                writeln!(out, "{}: {}", key.to_case(Case::Title), text_or_unspecified(answer))?;
            }
            writeln!(out)?;
        }

        writeln!(out, "AI ANALYSIS")?;
        writeln!(out, "Design Style: {}", profile.design_style_analysis)?;
        writeln!(out, "Space: {}", profile.space_analysis)?;
        writeln!(out, "Budget: {}", profile.budget_analysis)?;
        writeln!(out, "Timeline: {}\n", profile.timeline_analysis)?;

        writeln!(out, "DESIGN RECOMMENDATIONS")?;
        for (i, rec) in profile.recommendations.iter().enumerate() {
            writeln!(out, "{}. {} ({})", i + 1, rec.title, rec.category)?;
            writeln!(out, "   Priority: {}", rec.priority)?;
            writeln!(out, "   Description: {}", rec.description)?;
            writeln!(out, "   Reasoning: {}", rec.reasoning)?;
            writeln!(out, "   Estimated Cost: {}", or_unspecified(rec.estimated_cost.as_deref()))?;
            writeln!(out, "   Timeline: {}\n", or_unspecified(rec.timeline.as_deref()))?;
        }

        writeln!(out, "OVERALL RECOMMENDATION\n{}\n", profile.overall_recommendation)?;

        writeln!(out, "NEXT STEPS")?;
        for step in &profile.next_steps {
            writeln!(out, "- {}", step)?;
        }

        writeln!(out, "\nPROJECT ESTIMATES")?;
        writeln!(
            out,
            "Duration: {}",
            or_unspecified(profile.estimated_project_duration.as_deref())
        )?;
        writeln!(out, "Total Cost: {}", or_unspecified(profile.estimated_total_cost.as_deref()))?;
        writeln!(out, "\nGenerated by Interior AI Service using {}", profile.ai_model_used)?;

        Ok(())
    }
}

/// HTML body; every profile value is escaped.
struct HtmlReport<'a>(&'a ClientProfile);

impl fmt::Display for HtmlReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.0;
        let e = escape_html;

        write!(
            out,
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"UTF-8\"><title>Client Profile: {name}</title></head>\n\
             <body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto;\">\n\
             <h1>Client Profile: {name}</h1>\n<p>Generated on {date}</p>\n",
            name = e(&profile.client_name),
            date = generated_date(profile),
        )?;

        write!(
            out,
            "<h2>Contact</h2>\n<p><strong>Email:</strong> {}</p>\n<p><strong>Phone:</strong> {}</p>\n<p><strong>Timeline:</strong> {}</p>\n",
            e(text_or_unspecified(&profile.email)),
            e(text_or_unspecified(&profile.phone)),
            e(text_or_unspecified(&profile.timeline)),
        )?;

        write!(
            out,
            "<h2>Project Overview</h2>\n<p><strong>Type:</strong> {}</p>\n<p><strong>Summary:</strong> {}</p>\n\
             <p><strong>Address:</strong> {}</p>\n<p><strong>Budget:</strong> {}</p>\n<p><strong>Style:</strong> {}</p>\n",
            e(text_or_unspecified(&profile.project_type)),
            e(text_or_unspecified(&profile.project_summary)),
            e(or_unspecified(profile.property_address.as_deref())),
            e(or_unspecified(profile.budget_range.as_deref())),
            e(or_unspecified(profile.style_preference.as_deref())),
        )?;

        if !profile.answers.is_empty() {
            out.write_str("<h2>Questionnaire</h2>\n<table>\n")?;
            for (key, answer) in &profile.answers {
                writeln!(
                    out,
                    "<tr><th align=\"left\">{}</th><td>{}</td></tr>",
                    e(&key.to_case(Case::Title)),
                    e(text_or_unspecified(answer)),
                )?;
            }
            out.write_str("</table>\n")?;
        }

        write!(
            out,
            "<h2>AI Analysis</h2>\n<h3>Design Style</h3>\n<p>{}</p>\n<h3>Space</h3>\n<p>{}</p>\n\
             <h3>Budget</h3>\n<p>{}</p>\n<h3>Timeline</h3>\n<p>{}</p>\n",
            e(&profile.design_style_analysis),
            e(&profile.space_analysis),
            e(&profile.budget_analysis),
            e(&profile.timeline_analysis),
        )?;

        out.write_str("<h2>Design Recommendations</h2>\n")?;
        for (i, rec) in profile.recommendations.iter().enumerate() {
            write!(
                out,
                "<div class=\"recommendation priority-{priority_class}\">\n<h3>{n}. {title}</h3>\n\
                 <p><strong>Category:</strong> {category}</p>\n<p><strong>Priority:</strong> {priority}</p>\n\
                 <p><strong>Description:</strong> {description}</p>\n<p><strong>Reasoning:</strong> {reasoning}</p>\n\
                 <p><strong>Estimated Cost:</strong> {cost}</p>\n<p><strong>Timeline:</strong> {timeline}</p>\n</div>\n",
                priority_class = rec.priority.to_string().to_lowercase(),
                n = i + 1,
                title = e(&rec.title),
                category = e(&rec.category),
                priority = rec.priority,
                description = e(&rec.description),
                reasoning = e(&rec.reasoning),
                cost = e(or_unspecified(rec.estimated_cost.as_deref())),
                timeline = e(or_unspecified(rec.timeline.as_deref())),
            )?;
        }

        write!(
            out,
            "<h2>Overall Recommendation</h2>\n<p>{}</p>\n<h2>Next Steps</h2>\n<ol>\n",
            e(&profile.overall_recommendation)
        )?;
        for step in &profile.next_steps {
            writeln!(out, "<li>{}</li>", e(step))?;
        }
        out.write_str("</ol>\n")?;

        write!(
            out,
            "<h2>Project Estimates</h2>\n<p><strong>Duration:</strong> {}</p>\n<p><strong>Total Cost:</strong> {}</p>\n\
             <p style=\"color: #666; font-size: 14px;\">Generated by Interior AI Service using {}</p>\n</body>\n</html>\n",
            e(or_unspecified(profile.estimated_project_duration.as_deref())),
            e(or_unspecified(profile.estimated_total_cost.as_deref())),
            e(&profile.ai_model_used),
        )?;


        Ok(())
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
