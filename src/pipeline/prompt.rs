//! Prompt construction
//!
//! Every prompt ends with an output contract: a literal example of the JSON
//! the model must return and instructions to return nothing else. Optional
//! context (weather, coordinates, food preferences) is left out entirely when
//! absent rather than rendered as a placeholder.

use crate::trip::{ChatRequest, Pace, ShuffleRequest, TravelContext, TripRequest, Weather};

const TRIP_PLAN_EXAMPLE: &str = r#"{
  "days": [
    {
      "day": 1,
      "places": [
        {
          "name": "",
          "type": "",
          "description": "",
          "timing": "",
          "transport": "",
          "distance": ""
        }
      ]
    }
  ],
  "cafes": [
    {
      "name": "",
      "vibe": "",
      "price_range": "",
      "best_dishes": []
    }
  ],
  "medical": [],
  "tips": []
}"#;

const SHUFFLE_EXAMPLE: &str = r#"{
  "new_place": "place name",
  "description": "1-2 line reason"
}"#;

const JSON_RULES: &str = "\
CRITICAL JSON OUTPUT REQUIREMENTS:
1. Return ONLY valid JSON - absolutely no other text
2. Do NOT use markdown code blocks
3. Do NOT add explanations before or after
4. Start with { and end with }
5. Ensure all strings use double quotes
6. Ensure proper comma placement
7. No trailing commas before } or ]
";

/// Build the itinerary prompt for a trip request
pub fn build_trip_prompt(request: &TripRequest) -> String {
    let context = request.context();
    let destination = context.destination.as_str();
    let days = request.days();

    let coordinates = context
        .geotag
        .as_ref()
        .map(|geo| format!("- Coordinates: {}, {}\n", geo.latitude, geo.longitude))
        .unwrap_or_default();
    let weather = context
        .weather
        .as_ref()
        .map(|weather| format!("- Weather: {}\n", describe_weather(weather)))
        .unwrap_or_default();
    let weather_rule = context
        .weather
        .as_ref()
        .map(|weather| format!("- {}\n", weather_guidance(weather)))
        .unwrap_or_default();

    format!(
        "Generate a {days}-day trip plan for {destination}.\n\n\
         USER PREFERENCES:\n{preferences}\n\
         LOCATION DATA:\n\
         - City: {destination}\n\
         {coordinates}{weather}\n\
         EXCLUSIONS:\n\
         - Already visited: {visited}\n\
         - Previously shown: {shown}\n\n\
         IMPORTANT: Provide REAL, SPECIFIC places that actually exist in {destination}. \
         Do NOT use generic or fictional names.\n\n\
         Provide:\n\
         1. Exactly {days} day entries, numbered 1 to {days}, with {per_day} REAL attractions per day\n\
         2. Timing recommendations for every place\n\
         3. 4-7 REAL café/restaurant suggestions with actual names, vibes, price ranges, best dishes\n\
         4. 2-3 REAL nearby medical stores/pharmacies with actual names\n\
         5. Transport recommendations between places with realistic distances\n\
         6. Practical tips and medicine kit suggestions\n\n\
         RULES:\n\
         - Never repeat a place, across all days\n\
         - Never suggest a place listed under EXCLUSIONS\n\
         - Keep the whole trip within the total budget of {budget}\n\
         {weather_rule}\
         - Give distances in km\n\n\
         {JSON_RULES}\n\
         Return ONLY this JSON structure (start with {{, end with }}, nothing else):\n\
         {TRIP_PLAN_EXAMPLE}\n\n\
         VERY IMPORTANT:\n\
         - Your response must start with the character {{ and end with }}\n\
         - Do not include any text, explanations, or markdown formatting\n\
         - Return ONLY the raw JSON object",
        preferences = preferences(context),
        visited = join_or_none(request.visited()),
        shown = join_or_none(request.previously_shown()),
        per_day = places_per_day(context.pace),
        budget = format_budget(context.budget),
    )
}

/// Build the prompt asking for a single replacement place
pub fn build_shuffle_prompt(request: &ShuffleRequest) -> String {
    let context = request.context();
    let excluded: Vec<&str> = request.excluded_names().collect();
    let food = food_line(context);
    let weather = context
        .weather
        .as_ref()
        .map(|weather| format!("Weather: {}\n\n", describe_weather(weather)))
        .unwrap_or_default();

    format!(
        "Replace this place: \"{place}\" (type: {kind})\n\n\
         REQUIREMENTS:\n\
         - Same category/type as original\n\
         - Located in {destination} or nearby\n\
         - Match user interests: {interests}\n\
         - Suitable for a {style} trip with a total budget of {budget}\n\
         - Fits a {pace} pace\n\
         {food}\
         - Different vibe but relevant\n\
         - NOT these places: {excluded}\n\n\
         {weather}\
         CRITICAL: Return ONLY valid JSON. No explanations, no markdown, no code blocks, no extra text.\n\n\
         Return ONLY this JSON (nothing else):\n\
         {SHUFFLE_EXAMPLE}",
        place = request.place_name(),
        kind = request.place_type(),
        destination = context.destination,
        interests = context.interests.join(", "),
        style = context.travel_style.as_str(),
        budget = format_budget(context.budget),
        pace = context.pace.as_str(),
        excluded = excluded.join(", "),
    )
}

/// Build the free-form chat prompt
pub fn build_chat_prompt(request: &ChatRequest) -> String {
    let context = request
        .context()
        .map(|context| format!("Context: {context}\n\n"))
        .unwrap_or_default();
    format!(
        "User message: {}\n\n{context}Respond as TripGenie with helpful travel advice.",
        request.message()
    )
}

fn preferences(context: &TravelContext) -> String {
    format!(
        "- Interests: {}\n- Budget: {}\n- Pace: {}\n{}- Travel Style: {}\n",
        context.interests.join(", "),
        format_budget(context.budget),
        context.pace.as_str(),
        food_line(context),
        context.travel_style.as_str()
    )
}

/// `- Food: ..` line, empty when no preference was given
fn food_line(context: &TravelContext) -> String {
    if context.food_preferences.is_empty() {
        String::new()
    } else {
        format!("- Food: {}\n", context.food_preferences.join(", "))
    }
}

fn format_budget(budget: f64) -> String {
    format!("₹{budget} (INR)")
}

fn describe_weather(weather: &Weather) -> String {
    format!("{}°C, {}", weather.temperature, weather.condition)
}

fn weather_guidance(weather: &Weather) -> String {
    format!(
        "Plan timings around the current weather ({}): put outdoor places in the most \
         comfortable hours and suggest indoor alternatives when it is unsuitable",
        describe_weather(weather)
    )
}

fn places_per_day(pace: Pace) -> &'static str {
    match pace {
        Pace::Relaxed => "2-3",
        Pace::Moderate => "3-5",
        Pace::Packed => "5-6",
    }
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}
