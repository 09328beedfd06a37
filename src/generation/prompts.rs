//! Prompt templates sent to the completion endpoint.

use crate::models::CourseRequest;

pub fn outline_prompt(request: &CourseRequest) -> String {
    format!(
        "Create a detailed course outline for a {difficulty} level course titled \"{title}\" \
         that runs for {months} month(s).\n\
         Organize the outline by month. Start each month on its own line with \
         \"Month N: <topic>\".\n\
         Under each month, list its weekly subtopics on separate lines starting with \
         \"Week N: <subtopic>\".\n\
         For every week, state the learning objectives and include at least one \
         activity or assessment.\n\
         Return only the outline.",
        difficulty = request.difficulty,
        title = request.title,
        months = request.duration_months,
    )
}

pub fn unit_content_prompt(unit_name: &str, unit_description: &str, request: &CourseRequest) -> String {
    format!(
        "Write detailed learning content for the unit \"{unit}\" of the {difficulty} level \
         course \"{title}\".\n\
         Unit scope:\n{description}\n\n\
         Structure the content as follows:\n\
         1. Introduction\n\
         2. Theory and key concepts\n\
         3. At least 3 practical examples\n\
         4. A glossary of at least 10 terms with definitions\n\
         5. Real-world applications\n\
         6. Summary\n\
         7. At least 3 further readings",
        unit = unit_name,
        difficulty = request.difficulty,
        title = request.title,
        description = unit_description,
    )
}

pub fn activities_prompt(unit_name: &str, request: &CourseRequest) -> String {
    format!(
        "Design exactly 3 learning activities for the unit \"{unit}\" of the {difficulty} \
         level course \"{title}\".\n\
         For each activity give:\n\
         - a title\n\
         - step-by-step instructions\n\
         - a time estimate\n\
         - the expected outcomes\n\
         - reflection questions",
        unit = unit_name,
        difficulty = request.difficulty,
        title = request.title,
    )
}

pub fn highlight_prompt(highlighted: &str, unit_name: &str, module_name: &str) -> String {
    format!(
        "The following passage is part of the unit \"{unit}\" in \"{module}\".\n\
         Rewrite and expand it so it is clearer and more detailed. \
         Return only the replacement text.\n\n\
         {highlighted}",
        unit = unit_name,
        module = module_name,
    )
}

pub fn reason_prompt(reason: &str, unit_name: &str, module_name: &str, content: &str) -> String {
    format!(
        "Regenerate the content of the unit \"{unit}\" in \"{module}\".\n\
         Reason for the change: {reason}\n\
         Return only the new unit content.\n\n\
         Current content:\n{content}",
        unit = unit_name,
        module = module_name,
    )
}
