pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Coffee-shop menu used when no input file is given.
pub const SAMPLE_MENU: &str = "
Espresso Drinks
- Espresso: A strong coffee brewed by forcing hot water under pressure through finely ground coffee beans. $2.99
- Cappuccino: Espresso with steamed milk and a layer of foam. $3.99

Cold Brews
- Cold Brew: Coffee brewed cold for a smooth, rich flavor. $4.99
- Nitro Cold Brew: Cold brew infused with nitrogen for a creamy texture. $5.99
";

/// User message asking the model to structure `raw_text`. The text is
/// embedded verbatim between `---` lines.
pub fn build_prompt(raw_text: &str) -> String {
    format!(
        "You are a menu parser. Convert the following raw text from a coffee menu \
         into structured JSON with the fields:\n\
         - category\n\
         - item\n\
         - description\n\
         - price (if available)\n\
         \n\
         Here is the coffee menu text:\n\
         ---\n\
         {raw_text}\n\
         ---\n"
    )
}
