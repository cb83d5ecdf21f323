use injector_core::{Command, CommandTree, LifecycleReport, Plan};

pub fn print_plan(plan: &Plan) {
    println!("👤 Owner: {}", plan.owner);

    println!("\n📦 Load order:");
    if plan.load_order.is_empty() {
        println!("   (nothing to load)");
    }
    for (index, name) in plan.load_order.iter().enumerate() {
        let after = plan
            .prerequisites
            .get(name)
            .filter(|after| !after.is_empty())
            .map(|after| format!(" (after: {})", after.join(", ")))
            .unwrap_or_default();
        println!("   {}. {}{}", index + 1, name, after);
    }

    if !plan.disabled.is_empty() {
        println!("\n🚫 Disabled: {}", plan.disabled.join(", "));
    }

    if !plan.unsatisfied.is_empty() {
        println!("\n⚠️  Missing dependencies:");
        for name in &plan.unsatisfied {
            let after = plan
                .prerequisites
                .get(name)
                .map(|after| after.join(", "))
                .unwrap_or_default();
            println!("   • {} (after: {})", name, after);
        }
    }

    println!("\n🔁 Unload order: {}", plan.unload_order.join(" → "));
}

pub fn print_report(title: &str, report: &LifecycleReport) {
    println!("{}: {} action(s)", title, report.outcomes.len());
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("   ✅ {}", outcome.name),
            Err(e) => println!("   ❌ {}: {}", outcome.name, e),
        }
    }
    if !report.disabled.is_empty() {
        println!("   🚫 Disabled: {}", report.disabled.join(", "));
    }
    if !report.pruned.is_empty() {
        println!("   ⚠️  Not loaded: {}", report.pruned.join(", "));
    }
}

pub fn print_tree(tree: &CommandTree) {
    println!("\n📋 Commands:");
    if tree.is_empty() {
        println!("   (none)");
        return;
    }
    for command in tree.commands() {
        print_command(command, 1);
    }
}

fn print_command(command: &Command, depth: usize) {
    let indent = "   ".repeat(depth);
    let mut details = Vec::new();
    if !command.aliases().is_empty() {
        details.push(format!("aliases: {}", command.aliases().join(", ")));
    }
    if command.is_group() {
        details.push("group".to_string());
    }
    if let Some(owner) = command.owner() {
        details.push(format!("owner: {owner}"));
    }

    if details.is_empty() {
        println!("{}{}", indent, command.name());
    } else {
        println!("{}{} [{}]", indent, command.name(), details.join("; "));
    }

    for child in command.children() {
        print_command(child, depth + 1);
    }
}
