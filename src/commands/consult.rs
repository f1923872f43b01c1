//! Interactive consultation: the five-vector wizard and the chat REPL
//!
//! Every wizard prompt accepts `/skip` (next step) and `/all` (straight to
//! chat); an empty line takes the shown default. Ctrl-C or Ctrl-D leaves.

use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use super::{client, pipeline};
use crate::api::{ApiClient, Season};
use crate::capture::ImageFile;
use crate::chat::{ChatController, ChatEvent, MessageRole};
use crate::config::Config;
use crate::error::{classify, Result, SilError};
use crate::language::Language;
use crate::profile::{
    DietQuality, ExerciseFreq, Intensity, StressLevel, ThemeStyle, TpoOccasion, TpoPlace, TpoTime,
};
use crate::session::steps::{
    cities_in, find_city, resolve_by_city, resolve_by_location, resolve_default, CityGroup,
    LifestyleForm, ThemeForm, TpoForm,
};
use crate::session::{ChatContext, SessionEvent, SessionMachine, SessionStep, StepOutput};

/// What the user typed at a wizard prompt
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Line(String),
    Skip,
    SkipAll,
    Quit,
}

/// Outcome of one wizard step
enum StepResult {
    Done(StepOutput),
    Skip,
    SkipAll,
    Quit,
}

fn classify_input(line: &str) -> Input {
    match line.trim() {
        "/skip" => Input::Skip,
        "/all" => Input::SkipAll,
        "/exit" | "/quit" => Input::Quit,
        other => Input::Line(other.to_string()),
    }
}

fn read(rl: &mut DefaultEditor, prompt: &str) -> Result<Input> {
    match rl.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
            Ok(classify_input(&line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(Input::Quit),
        Err(e) => Err(anyhow::anyhow!("Readline error: {}", e)),
    }
}

/// A form value, or the control input that ended the step
type Answer<T> = std::result::Result<T, StepResult>;

/// Turn one prompt input into an answer; `None` means ask again
fn answer_from<T: FromStr>(input: Input, default: T) -> Option<Answer<T>> {
    match input {
        Input::Line(line) if line.is_empty() => Some(Ok(default)),
        Input::Line(line) => line.parse::<T>().ok().map(Ok),
        Input::Skip => Some(Err(StepResult::Skip)),
        Input::SkipAll => Some(Err(StepResult::SkipAll)),
        Input::Quit => Some(Err(StepResult::Quit)),
    }
}

/// Ask for one enum value, offering every choice and a default
fn ask_choice<T>(
    rl: &mut DefaultEditor,
    label: &str,
    choices: &[T],
    default: T,
) -> Result<Answer<T>>
where
    T: Copy + Display + FromStr,
{
    let options: Vec<String> = choices.iter().map(|c| c.to_string()).collect();
    loop {
        let prompt = format!("{} [{}] ({}): ", label, options.join("/"), default);
        let input = read(rl, &prompt)?;
        let shown = input.clone();
        match answer_from(input, default) {
            Some(answer) => return Ok(answer),
            None => {
                if let Input::Line(line) = shown {
                    println!("{}", format!("Unknown value: {}", line).red());
                }
            }
        }
    }
}

fn ask_number(rl: &mut DefaultEditor, label: &str, default: f64) -> Result<Answer<f64>> {
    loop {
        let input = read(rl, &format!("{} ({}): ", label, default))?;
        let shown = input.clone();
        match answer_from(input, default) {
            Some(Ok(value)) if !value.is_finite() => {}
            Some(answer) => return Ok(answer),
            None => {}
        }
        if let Input::Line(line) = shown {
            println!("{}", format!("Not a number: {}", line).red());
        }
    }
}

/// Unwrap a form answer or return the control result from the step
macro_rules! answer {
    ($e:expr) => {
        match $e? {
            Ok(value) => value,
            Err(control) => return Ok(control),
        }
    };
}

/// Run the wizard (unless skipped) and then the chat REPL
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `skip_setup` - Go straight to chat
/// * `photo` - Image to use for the skin scan step
pub async fn run_consult(config: Config, skip_setup: bool, photo: Option<PathBuf>) -> Result<()> {
    let client = client(&config)?;
    let lang = config.session.language;
    let mut rl = DefaultEditor::new()?;
    let mut session = SessionMachine::new();

    print_welcome(lang);
    if skip_setup {
        session.apply(SessionEvent::SkipAll)?;
    } else {
        let prompt = format!(
            "[Enter] {} / [/all] {}: ",
            lang.t("welcome_start"),
            lang.t("welcome_skip")
        );
        match read(&mut rl, &prompt)? {
            Input::Quit => return Ok(()),
            Input::SkipAll => session.apply(SessionEvent::SkipAll)?,
            _ => session.apply(SessionEvent::Start)?,
        };
    }

    let mut photo = photo;
    while !session.is_chat() {
        print_step_header(&session, lang);
        let result = match session.step() {
            SessionStep::Persona => persona_step(&mut rl, &client, lang).await?,
            SessionStep::SkinScan => skin_step(&mut rl, &config, &client, photo.take()).await?,
            SessionStep::Environment => environment_step(&mut rl, &client, lang).await?,
            SessionStep::Lifestyle => lifestyle_step(&mut rl)?,
            SessionStep::Tpo => tpo_step(&mut rl)?,
            SessionStep::Theme => theme_step(&mut rl)?,
            SessionStep::Welcome | SessionStep::Chat => StepResult::Skip,
        };
        let event = match result {
            StepResult::Done(output) => SessionEvent::Complete(output),
            StepResult::Skip => SessionEvent::Skip,
            StepResult::SkipAll => SessionEvent::SkipAll,
            StepResult::Quit => {
                println!("Goodbye!");
                return Ok(());
            }
        };
        session.apply(event)?;
    }

    match session.chat_context() {
        Some(context) => run_chat(&config, client, &mut rl, context).await,
        None => Ok(()),
    }
}

fn print_welcome(lang: Language) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║  {:<60}║", format!("SIL · {}", lang.t("welcome_title")));
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("{}\n", lang.t("welcome_desc"));
}

fn print_step_header(session: &SessionMachine, lang: Language) {
    let position = session.wizard_position().unwrap_or(0);
    let done = session.profile().completed().len();
    println!(
        "\n{} {}  {}",
        format!("[{}/6]", position).cyan(),
        session.step().label(lang).bold(),
        format!("({}/5 vectors, /skip, /all = {})", done, lang.t("skip_all")).dimmed()
    );
}

async fn persona_step(
    rl: &mut DefaultEditor,
    client: &ApiClient,
    lang: Language,
) -> Result<StepResult> {
    let personas = match client.get_personas(lang).await {
        Ok(personas) if !personas.is_empty() => personas,
        Ok(_) => {
            println!("{}", "No personas available".yellow());
            return Ok(StepResult::Skip);
        }
        Err(e) => {
            tracing::warn!("Could not load personas: {:#}", e);
            println!("{}", format!("Personas unavailable: {}", e).yellow());
            return Ok(StepResult::Skip);
        }
    };

    for (i, persona) in personas.iter().enumerate() {
        println!(
            "  {}. {} {} - {}",
            i + 1,
            persona.emoji,
            persona.name.bold(),
            persona.subtitle
        );
    }
    loop {
        match read(rl, "persona #: ")? {
            Input::Line(line) => match line.parse::<usize>() {
                Ok(n) if (1..=personas.len()).contains(&n) => {
                    return Ok(StepResult::Done(StepOutput::Persona(personas[n - 1].clone())))
                }
                _ => println!("{}", format!("Pick 1-{}", personas.len()).red()),
            },
            Input::Skip => return Ok(StepResult::Skip),
            Input::SkipAll => return Ok(StepResult::SkipAll),
            Input::Quit => return Ok(StepResult::Quit),
        }
    }
}

async fn skin_step(
    rl: &mut DefaultEditor,
    config: &Config,
    client: &Arc<ApiClient>,
    photo: Option<PathBuf>,
) -> Result<StepResult> {
    let lang = config.session.language;
    let pipeline = pipeline(config, client.clone(), None);
    let mut next_path = photo;

    loop {
        let path = match next_path.take() {
            Some(path) => path,
            None => match read(rl, "photo path: ")? {
                Input::Line(line) if line.is_empty() => continue,
                Input::Line(line) => PathBuf::from(line),
                Input::Skip => return Ok(StepResult::Skip),
                Input::SkipAll => return Ok(StepResult::SkipAll),
                Input::Quit => return Ok(StepResult::Quit),
            },
        };

        let file = match ImageFile::from_path(&path).await {
            Ok(file) => file,
            Err(e) => {
                println!("{}", format!("Cannot read {}: {}", path.display(), e).red());
                continue;
            }
        };

        println!("{}", lang.t("skin_analyzing").cyan());
        match pipeline.analyze_file(&file).await {
            Ok(outcome) => {
                if outcome.is_fallback() {
                    println!("{}", lang.t("skin_fallback").yellow());
                } else {
                    println!("{}", lang.t("skin_complete").green());
                }
                print_analysis(&outcome.analysis);
                return Ok(StepResult::Done(StepOutput::SkinScan(outcome.analysis)));
            }
            Err(e) => {
                // Local rejection; let the user pick another file
                println!("{}", e.to_string().red());
            }
        }
    }
}

fn print_analysis(analysis: &crate::profile::SkinAnalysis) {
    for issue in &analysis.issues {
        let severity = analysis.severity.get(issue).copied().unwrap_or(0.0);
        println!("  {:<14} {:>3.0}%", issue.as_str(), severity * 100.0);
    }
    if let Some(hydration) = analysis.hydration {
        println!("  {:<14} {:>3.0}", "hydration", hydration);
    }
    if let Some(oil) = analysis.oil_level {
        println!("  {:<14} {:>3.0}", "oil_level", oil);
    }
}

async fn environment_step(
    rl: &mut DefaultEditor,
    client: &ApiClient,
    lang: Language,
) -> Result<StepResult> {
    println!("  [Enter] {}  |  lat,lon", lang.t("env_detect"));
    println!("  {}:", lang.t("env_or_select"));
    for group in CityGroup::ALL {
        let names: Vec<String> = cities_in(group)
            .map(|c| format!("{} ({})", c.id, c.name(lang)))
            .collect();
        println!("    {} {}", group.code().bold(), names.join(", "));
    }

    loop {
        let line = match read(rl, "location or city [season]: ")? {
            Input::Line(line) => line,
            Input::Skip => return Ok(StepResult::Skip),
            Input::SkipAll => return Ok(StepResult::SkipAll),
            Input::Quit => return Ok(StepResult::Quit),
        };

        let weather = if line.is_empty() {
            resolve_default(client).await
        } else if let Some((lat, lon)) = parse_coordinates(&line) {
            resolve_by_location(client, lat, lon).await
        } else {
            let mut parts = line.split_whitespace();
            let city = parts.next().unwrap_or_default();
            let season = match parts.next().map(Season::from_str).transpose() {
                Ok(season) => season,
                Err(e) => {
                    println!("{}", e.to_string().red());
                    continue;
                }
            };
            if find_city(city).is_none() {
                println!("{}", format!("Unknown city: {}", city).red());
                continue;
            }
            resolve_by_city(client, city, season).await
        };

        println!(
            "  {} {:.0}°C, {:.0}%, UV {:.0}, {}",
            weather.city.bold(),
            weather.temp,
            weather.humidity,
            weather.uvi,
            weather.description
        );
        return Ok(StepResult::Done(StepOutput::Environment(weather)));
    }
}

fn parse_coordinates(line: &str) -> Option<(f64, f64)> {
    let (lat, lon) = line.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

fn lifestyle_step(rl: &mut DefaultEditor) -> Result<StepResult> {
    let mut form = LifestyleForm::default();
    let sleep = answer!(ask_number(rl, "sleep hours (3-12)", form.sleep_hours()));
    form.set_sleep_hours(sleep);
    form.stress_level = answer!(ask_choice(rl, "stress", StressLevel::ALL, form.stress_level));
    form.water_intake = answer!(ask_number(rl, "water (glasses)", form.water_intake));
    form.exercise_freq = answer!(ask_choice(rl, "exercise", ExerciseFreq::ALL, form.exercise_freq));
    form.diet_quality = answer!(ask_choice(rl, "diet", DietQuality::ALL, form.diet_quality));
    Ok(StepResult::Done(StepOutput::Lifestyle(form.finish())))
}

fn tpo_step(rl: &mut DefaultEditor) -> Result<StepResult> {
    let mut form = TpoForm::default();
    form.time = answer!(ask_choice(rl, "time", TpoTime::ALL, form.time));
    form.place = answer!(ask_choice(rl, "place", TpoPlace::ALL, form.place));
    form.occasion = answer!(ask_choice(rl, "occasion", TpoOccasion::ALL, form.occasion));
    Ok(StepResult::Done(StepOutput::Tpo(form.finish())))
}

fn theme_step(rl: &mut DefaultEditor) -> Result<StepResult> {
    let mut form = ThemeForm::default();
    form.style = answer!(ask_choice(rl, "style", ThemeStyle::ALL, form.style));
    form.finish = match read(rl, &format!("finish ({}): ", form.finish))? {
        Input::Line(line) if line.is_empty() => form.finish,
        Input::Line(line) => line,
        Input::Skip => return Ok(StepResult::Skip),
        Input::SkipAll => return Ok(StepResult::SkipAll),
        Input::Quit => return Ok(StepResult::Quit),
    };
    form.intensity = answer!(ask_choice(rl, "intensity", Intensity::ALL, form.intensity));
    Ok(StepResult::Done(StepOutput::Theme(form.finish())))
}

/// Prints chat events as they arrive
#[derive(Debug, Default)]
struct Renderer {
    /// Bytes of each message already written to stdout
    printed: HashMap<String, usize>,
}

impl Renderer {
    fn render(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::MessageAppended(message) if message.role == MessageRole::Assistant => {
                if let Some(expert) = &message.expert {
                    print!("\n{} {}: ", expert.emoji, expert.name.bold());
                }
                print!("{}", message.content);
                if !message.content.is_empty() {
                    println!();
                }
                self.printed.insert(message.id, message.content.len());
            }
            ChatEvent::MessageAppended(_) => {}
            ChatEvent::MessageUpdated { id, content } => {
                let done = self.printed.entry(id).or_insert(0);
                if let Some(delta) = content.get(*done..) {
                    print!("{}", delta);
                }
                *done = content.len();
            }
            ChatEvent::MessageRemoved { id } => {
                self.printed.remove(&id);
                println!("{}", " [stream interrupted]".dimmed());
            }
            ChatEvent::Loading(false) => println!(),
            ChatEvent::Loading(true) => {}
        }
        let _ = std::io::stdout().flush();
    }
}

async fn run_chat(
    config: &Config,
    client: Arc<ApiClient>,
    rl: &mut DefaultEditor,
    context: ChatContext,
) -> Result<()> {
    let lang = config.session.language;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = ChatController::new(client, lang, config.session.default_persona_id.clone())
        .with_events(tx)
        .with_expert(context.expert.clone());
    if let Some(persona) = &context.persona {
        controller.select_persona(persona);
    }
    let vectors = context.vectors;
    let mut renderer = Renderer::default();

    println!(
        "\n{} {} · {}",
        context.expert.emoji,
        context.expert.name.bold(),
        context.expert.role
    );
    println!("{}", lang.t("chat_disclaimer").dimmed());
    println!("{}", lang.t("chat_placeholder").italic());

    loop {
        let prompts = controller.quick_prompts(&vectors);
        for (i, prompt) in prompts.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).cyan(), prompt);
        }

        let line = match rl.readline(&format!("{} ", "you>".green())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(anyhow::anyhow!("Readline error: {}", e)),
        };
        let trimmed = line.trim();
        if trimmed == "/exit" || trimmed == "/quit" {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        let content = match trimmed.parse::<usize>() {
            Ok(n) if (1..=prompts.len()).contains(&n) => prompts[n - 1].clone(),
            _ => trimmed.to_string(),
        };

        let send = controller.send(&content, &vectors);
        tokio::pin!(send);
        let result = loop {
            tokio::select! {
                result = &mut send => break result,
                Some(event) = rx.recv() => renderer.render(event),
            }
        };
        while let Ok(event) = rx.try_recv() {
            renderer.render(event);
        }

        if let Err(e) = result {
            match classify(&e) {
                Some(SilError::Validation(_)) | Some(SilError::Busy) => {}
                _ => eprintln!("{}", format!("Error: {}", e).red()),
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
