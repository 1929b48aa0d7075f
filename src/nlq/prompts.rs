//! Prompt builders for the chat-model stages

use crate::intent::Intent;

/// Prompt asking the model to name exactly one intent
pub fn intent_prompt(question: &str) -> String {
    let mut prompt = String::from(
        "You classify questions about an airline operations knowledge graph.\n\
         Reply with exactly one intent name from this list and nothing else:\n",
    );
    for intent in Intent::ALL {
        prompt.push_str("- ");
        prompt.push_str(intent.as_str());
        prompt.push('\n');
    }
    prompt.push_str(
        "\nExamples:\n\
         Q: Which flights from LAX to ORD have the longest delays? -> most_delayed_flights\n\
         Q: Which airports see the most journeys? -> popular_airports\n\
         Q: What aircraft flies flight 2411? -> flight_aircraft\n\
         Q: Is there a direct flight from JFK to SFO? -> direct_flight\n\
         Q: Which generation travels most from ORD? -> dominant_generation_airport\n\n",
    );
    prompt.push_str("Question: ");
    prompt.push_str(question.trim());
    prompt.push_str("\nIntent:");
    prompt
}

/// Prompt asking the model for the query parameters as a JSON object
pub fn entity_prompt(intent: Intent, question: &str) -> String {
    let wanted: Vec<&str> = intent.template().params.iter().map(|p| p.as_str()).collect();
    format!(
        "Extract query parameters from a question about airline flights.\n\
         Return a single JSON object with the keys origin, destination, flight_number, code and limit.\n\
         Airports are three-letter station codes. flight_number is the numeric part only.\n\
         limit defaults to 5. Use null for anything the question does not mention.\n\
         The intent is {intent}; it uses: {wanted}.\n\n\
         Examples:\n\
         Q: Top 3 most delayed flights from LAX to ORD\n\
         {{\"origin\": \"LAX\", \"destination\": \"ORD\", \"flight_number\": null, \"code\": null, \"limit\": 3}}\n\
         Q: Classes on flight UA123\n\
         {{\"origin\": null, \"destination\": null, \"flight_number\": 123, \"code\": null, \"limit\": 5}}\n\
         Q: Which generation flies most out of DEN?\n\
         {{\"origin\": null, \"destination\": null, \"flight_number\": null, \"code\": \"DEN\", \"limit\": 5}}\n\n\
         Question: {question}\n\
         JSON:",
        intent = intent,
        wanted = wanted.join(", "),
        question = question.trim(),
    )
}

/// Prompt that grounds the answer in retrieved evidence
pub fn answer_prompt(question: &str, baseline: &str, embedding: &str, refusal: &str) -> String {
    format!(
        "You answer questions about airline operations using only the facts below.\n\
         BASELINE CONTEXT holds exact query results; EMBEDDING CONTEXT holds similar journeys.\n\
         Entries in EMBEDDING CONTEXT that carry a message or error are not facts; ignore them.\n\
         If BASELINE CONTEXT is empty or only carries a message or error, reply exactly: {refusal}\n\
         Do not invent numbers, flights or airports.\n\n\
         BASELINE CONTEXT:\n{baseline}\n\n\
         EMBEDDING CONTEXT:\n{embedding}\n\n\
         Question: {question}\n\
         Answer:",
        refusal = refusal,
        baseline = baseline,
        embedding = embedding,
        question = question.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_prompt_lists_every_intent() {
        let prompt = intent_prompt("Is there a nonstop from JFK to SFO?");
        for intent in Intent::ALL {
            assert!(prompt.contains(intent.as_str()));
        }
        assert!(prompt.ends_with("Is there a nonstop from JFK to SFO?\nIntent:"));
    }

    #[test]
    fn test_entity_prompt_names_used_params() {
        let prompt = entity_prompt(Intent::RouteDistance, "How far is LAX to ORD?");
        assert!(prompt.contains("it uses: origin, destination."));
        assert!(prompt.contains("Question: How far is LAX to ORD?"));
    }
}
