use std::io::{self, Write};
use std::sync::Arc;

use color_eyre::eyre::Result;

use rasoi_remote::{MockBackend, User};
use rasoi_sync::{
    ChatEvent, ChatStore, DeliveryState, DraftFields, DraftReconciler, OnboardingStep,
    OutgoingMessage, PushOutcome, RasoiDb,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .from_env_lossy()
                .add_directive("rasoi_cli=info".parse().unwrap())
                .add_directive("rasoi_sync=info".parse().unwrap())
                .add_directive("rasoi_db=info".parse().unwrap()),
        )
        .init();

    let db = Arc::new(RasoiDb::new().await?);
    let backend = MockBackend::new();
    backend
        .sign_in(User {
            id: "partner_1".into(),
            phone: "+9230012345".into(),
            name: Some("Asim".into()),
        })
        .await;

    let reconciler = DraftReconciler::new(db.clone(), backend.clone());
    let mut chat = ChatStore::new(backend.clone(), backend.clone());

    if let Some(mut event_rx) = chat.take_event_receiver() {
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                handle_event(event);
            }
        });
    }

    loop {
        print_menu();
        let choice = read_line("Choice: ")?;

        match choice.trim() {
            "1" => resume_onboarding(&reconciler).await?,
            "2" => save_step(&reconciler).await?,
            "3" => submit_application(&reconciler).await?,
            "4" => open_conversation(&chat).await?,
            "5" => send_message(&chat).await?,
            "6" => simulate_incoming(&backend).await?,
            "7" => toggle_outage(&backend)?,
            "0" => {
                println!("👋 Bye");
                break;
            }
            _ => println!("❌ Invalid choice"),
        }
    }

    Ok(())
}

fn print_menu() {
    println!();
    println!("╔════════════════════════════════════╗");
    println!("║        RASOI PARTNER - DEMO        ║");
    println!("╠════════════════════════════════════╣");
    println!("║  1. Resume onboarding              ║");
    println!("║  2. Save onboarding step           ║");
    println!("║  3. Submit application             ║");
    println!("║  4. Open conversation              ║");
    println!("║  5. Send message                   ║");
    println!("║  6. Simulate incoming message      ║");
    println!("║  7. Toggle backend outage          ║");
    println!("║  0. Exit                           ║");
    println!("╚════════════════════════════════════╝");
}

fn handle_event(event: ChatEvent) {
    match event {
        ChatEvent::HistoryLoaded { conversation_id, count } => {
            println!("\n📜 Loaded {} messages for {}", count, conversation_id);
        }
        ChatEvent::MessageInserted { message, .. } => {
            println!(
                "\n⏳ Sending: {}",
                message.content.as_deref().unwrap_or("[media]")
            );
        }
        ChatEvent::MessageConfirmed { temp_id, message, .. } => {
            println!("\n✅ Confirmed {} as {}", temp_id, message.id);
        }
        ChatEvent::MessageFailed { temp_id, reason, .. } => {
            println!("\n❌ Send failed for {}: {}", temp_id, reason);
        }
        ChatEvent::MessagePushed { message, .. } => {
            println!(
                "\n💬 {}: {}",
                message.sender_phone,
                message.content.as_deref().unwrap_or("[media]")
            );
        }
    }
}

async fn resume_onboarding(reconciler: &DraftReconciler<MockBackend>) -> Result<()> {
    let phone = read_line("Phone (+92...): ")?;
    let draft = reconciler.resume(phone.trim()).await?;

    if draft.is_empty() {
        println!("📭 No draft found, starting fresh");
    } else {
        println!("📋 Draft resumes at step {:?}", draft.step);
        print_draft(&draft);
    }
    Ok(())
}

async fn save_step(reconciler: &DraftReconciler<MockBackend>) -> Result<()> {
    let step = read_line("Step (phone/otp/owner_profile/kitchen_details/kitchen_address/categories/documents/review): ")?;
    let Some(step) = parse_step(step.trim()) else {
        println!("❌ Unknown step");
        return Ok(());
    };

    let mut partial = DraftFields {
        step: Some(step),
        ..DraftFields::default()
    };

    let phone = read_line("Phone (empty to keep): ")?;
    if !phone.trim().is_empty() {
        partial.phone = Some(phone.trim().to_string());
    }
    let full_name = read_line("Owner name (empty to keep): ")?;
    if !full_name.trim().is_empty() {
        partial.full_name = Some(full_name.trim().to_string());
    }
    let kitchen_name = read_line("Kitchen name (empty to keep): ")?;
    if !kitchen_name.trim().is_empty() {
        partial.kitchen_name = Some(kitchen_name.trim().to_string());
    }

    match reconciler.merge_and_persist(partial).await {
        Ok(result) => {
            match result.remote {
                PushOutcome::Synced => println!("✅ Saved and mirrored"),
                PushOutcome::Failed(reason) => {
                    println!("⚠️ Saved locally; mirror push failed: {}", reason);
                }
            }
            print_draft(&result.draft);
        }
        Err(e) => println!("❌ Save rejected: {}", e),
    }
    Ok(())
}

async fn submit_application(reconciler: &DraftReconciler<MockBackend>) -> Result<()> {
    match reconciler.finish().await? {
        PushOutcome::Synced => println!("🎉 Application submitted, draft cleared"),
        PushOutcome::Failed(reason) => {
            println!("⚠️ Submission kept locally; push failed: {}", reason);
        }
    }
    Ok(())
}

async fn open_conversation(chat: &ChatStore<MockBackend, MockBackend>) -> Result<()> {
    let id = read_line("Conversation ID: ")?;
    let id = id.trim();

    chat.load_history(id).await?;
    chat.attach(id).await?;

    for msg in chat.messages(id) {
        let marker = match msg.delivery {
            DeliveryState::Pending => "⏳",
            DeliveryState::Sent => "✅",
            DeliveryState::Failed => "❌",
        };
        println!(
            "  {} {}: {}",
            marker,
            msg.sender_phone,
            msg.content.as_deref().unwrap_or("[media]")
        );
    }
    Ok(())
}

async fn send_message(chat: &ChatStore<MockBackend, MockBackend>) -> Result<()> {
    let id = read_line("Conversation ID: ")?;
    let content = read_line("Message: ")?;

    let temp_id = chat
        .send(OutgoingMessage::text(id.trim(), content.trim()))
        .await?;
    println!("📤 Queued as {}", temp_id);
    Ok(())
}

async fn simulate_incoming(backend: &MockBackend) -> Result<()> {
    let id = read_line("Conversation ID: ")?;
    let content = read_line("Message: ")?;

    backend
        .push_from_server(rasoi_sync::ChatMessage {
            id: format!("srv_{}", now_millis()),
            conversation_id: id.trim().to_string(),
            sender_phone: "+9230054321".into(),
            content: Some(content.trim().to_string()),
            image_url: None,
            audio_url: None,
            location: None,
            timestamp: now_millis(),
            delivery: DeliveryState::Sent,
        })
        .await;
    Ok(())
}

fn toggle_outage(backend: &MockBackend) -> Result<()> {
    let target = read_line("Outage target (sessions/sends/none): ")?;
    match target.trim() {
        "sessions" => {
            backend.fail_sessions(true);
            backend.fail_sends(false);
            println!("🔌 Session API is now down");
        }
        "sends" => {
            backend.fail_sessions(false);
            backend.fail_sends(true);
            println!("🔌 Message sends now fail");
        }
        "none" => {
            backend.fail_sessions(false);
            backend.fail_sends(false);
            println!("🔌 Backend restored");
        }
        _ => println!("❌ Unknown target"),
    }
    Ok(())
}

fn parse_step(s: &str) -> Option<OnboardingStep> {
    Some(match s {
        "phone" => OnboardingStep::Phone,
        "otp" => OnboardingStep::Otp,
        "owner_profile" => OnboardingStep::OwnerProfile,
        "kitchen_details" => OnboardingStep::KitchenDetails,
        "kitchen_address" => OnboardingStep::KitchenAddress,
        "categories" => OnboardingStep::Categories,
        "documents" => OnboardingStep::Documents,
        "review" => OnboardingStep::Review,
        _ => return None,
    })
}

fn print_draft(draft: &DraftFields) {
    if let Some(phone) = &draft.phone {
        println!("  📱 phone: {}", phone);
    }
    if let Some(name) = &draft.full_name {
        println!("  👤 owner: {}", name);
    }
    if let Some(kitchen) = &draft.kitchen_name {
        println!("  🍳 kitchen: {}", kitchen);
    }
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
